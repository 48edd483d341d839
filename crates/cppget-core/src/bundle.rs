//! Bundle assembly: read included files in order and render delimited blocks.
//!
//! Each written file renders as:
//!
//! ```text
//!
//! #================================================================================
//! # src/world.cpp (cpp)
//! #================================================================================
//!
//! <trimmed content>
//!
//! ```
//!
//! The content lines and their trailing blank line are omitted when the file
//! is empty and `include_empty` forced it in. Read failures never abort a
//! run: the file is treated as empty and counted in
//! [`GatherReport::read_failures`].

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::RootConfig;
use crate::digest::{ContentHash, DigestWriter};
use crate::error::{GatherError, GatherResult};
use crate::rules::FilterRules;
use crate::tree::render_tree;
use crate::walker::{CandidateEntry, PathFilterWalker};

/// Number of `=` characters in a delimiter line.
pub const DELIMITER_WIDTH: usize = 80;

/// Type tag for files without an extension.
pub const NO_EXTENSION_TAG: &str = "file";

// ============================================================================
// Options and Report
// ============================================================================

/// Switches controlling what gets written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherOptions {
    /// Write files whose trimmed content is empty.
    pub include_empty: bool,
    /// Append a tree of included paths after the last file.
    pub append_tree: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherReport {
    /// Project name of the root.
    pub project_name: String,
    /// Canonical root directory.
    pub root_dir: PathBuf,
    /// Where the bundle was written.
    pub output_file: PathBuf,
    /// Files that passed every filter and were read.
    pub files_processed: usize,
    /// Files actually written to the bundle.
    pub files_included: usize,
    /// Files whose read failed and were treated as empty.
    pub read_failures: usize,
    /// Total bytes written.
    pub bytes_written: u64,
    /// SHA-256 of the written bytes.
    pub digest: ContentHash,
    /// Relative paths written, in bundle order.
    pub included: Vec<String>,
}

impl GatherReport {
    /// A run succeeds iff at least one file was written.
    pub fn is_success(&self) -> bool {
        self.files_included > 0
    }
}

// ============================================================================
// Included File
// ============================================================================

/// One file as it appears in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFile {
    /// Root-relative, `/`-separated path.
    pub relative_path: String,
    /// Extension without the dot, or [`NO_EXTENSION_TAG`].
    pub type_tag: String,
    /// Content with surrounding whitespace trimmed.
    pub content: String,
}

impl IncludedFile {
    /// Build from a relative path and raw content; trims the content.
    pub fn new(relative_path: impl Into<String>, raw_content: &str) -> Self {
        let relative_path = relative_path.into();
        let type_tag = type_tag(&relative_path);
        IncludedFile {
            relative_path,
            type_tag,
            content: raw_content.trim_matches(is_trimmed_char).to_string(),
        }
    }

    /// Render this file's block.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        write_header(
            out,
            &format!("{} ({})", self.relative_path, self.type_tag),
        )?;
        if !self.content.is_empty() {
            write!(out, "{}\n\n", self.content)?;
        }
        Ok(())
    }
}

/// Unicode whitespace plus the ASCII separators U+001C..=U+001F.
fn is_trimmed_char(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Extension of the final path segment, or [`NO_EXTENSION_TAG`].
///
/// Dotfiles such as `.clang-format` and names ending in `.` have no extension.
pub fn type_tag(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| NO_EXTENSION_TAG.to_string())
}

/// Write a delimiter/title/delimiter header followed by a blank line.
pub(crate) fn write_header(out: &mut impl Write, title: &str) -> io::Result<()> {
    let delimiter = "=".repeat(DELIMITER_WIDTH);
    write!(out, "\n#{}\n# {}\n#{}\n\n", delimiter, title, delimiter)
}

/// Read a file as text, dropping byte sequences that are not valid UTF-8.
pub fn read_text(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_utf8_ignoring_invalid(&bytes))
}

fn decode_utf8_ignoring_invalid(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return text,
                }
            }
        }
    }
}

// ============================================================================
// Gathering
// ============================================================================

/// Walk, filter and render the bundle into `out`.
///
/// Fatal only for an unreadable root or a failing writer.
pub fn gather_files<W: Write>(
    config: &RootConfig,
    rules: &FilterRules,
    options: &GatherOptions,
    out: &mut W,
) -> GatherResult<GatherReport> {
    log_configuration(config, rules, options);
    let files = PathFilterWalker::new(config.root_dir(), rules).collect_files()?;
    write_bundle(config, &files, options, out)
}

/// Like [`gather_files`], writing to `config.output_file()`.
///
/// The destination is created only after the walk succeeds, written through a
/// buffer, and flushed before returning.
pub fn gather_to_file(
    config: &RootConfig,
    rules: &FilterRules,
    options: &GatherOptions,
) -> GatherResult<GatherReport> {
    log_configuration(config, rules, options);
    let files = PathFilterWalker::new(config.root_dir(), rules).collect_files()?;

    let output = config.output_file();
    let file = File::create(output).map_err(|e| GatherError::output(output, e))?;
    let mut writer = BufWriter::new(file);
    let report = write_bundle(config, &files, options, &mut writer)?;
    writer.flush().map_err(|e| GatherError::output(output, e))?;
    Ok(report)
}

/// Render already-collected files in the given order.
pub fn write_bundle<W: Write>(
    config: &RootConfig,
    files: &[CandidateEntry],
    options: &GatherOptions,
    out: &mut W,
) -> GatherResult<GatherReport> {
    let output = config.output_file();
    let mut sink = DigestWriter::new(out);
    let mut files_processed = 0;
    let mut read_failures = 0;
    let mut included = Vec::new();

    for candidate in files {
        files_processed += 1;

        let raw = match read_text(candidate.absolute_path()) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "error processing {}: {}",
                    candidate.absolute_path().display(),
                    err
                );
                read_failures += 1;
                String::new()
            }
        };

        let file = IncludedFile::new(candidate.relative_path(), &raw);
        if file.content.is_empty() && !options.include_empty {
            debug!("omitting empty file: {}", file.relative_path);
            continue;
        }

        debug!("including: {}", file.relative_path);
        file.render(&mut sink)
            .map_err(|e| GatherError::output(output, e))?;
        included.push(file.relative_path);
    }

    if options.append_tree && !included.is_empty() {
        render_tree(&included, &mut sink).map_err(|e| GatherError::output(output, e))?;
    }

    let (bytes_written, digest) = sink.finish();
    let report = GatherReport {
        project_name: config.project_name().to_string(),
        root_dir: config.root_dir().to_path_buf(),
        output_file: output.to_path_buf(),
        files_processed,
        files_included: included.len(),
        read_failures,
        bytes_written,
        digest,
        included,
    };

    debug!("summary:");
    debug!("  files processed: {}", report.files_processed);
    debug!("  files included: {}", report.files_included);
    debug!("  output file: {}", report.output_file.display());

    Ok(report)
}

fn log_configuration(config: &RootConfig, rules: &FilterRules, options: &GatherOptions) {
    debug!("root directory: {}", config.root_dir().display());
    debug!("project name: {}", config.project_name());
    debug!("output file: {}", config.output_file().display());
    debug!("file types: {:?}", rules.extensions());
    debug!("ignore patterns: {:?}", rules.ignore_patterns());
    debug!("include empty: {}", options.include_empty);
    debug!("append tree: {}", options.append_tree);
    debug!("whitelist dirs: {:?}", rules.top_level_dirs());
    debug!("whitelist root files: {:?}", rules.root_files());
}
