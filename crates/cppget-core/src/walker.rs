//! Pruned depth-first traversal of a project root.
//!
//! Directories are passed through [`FilterRules::should_skip`] before walkdir
//! descends into them, so files below a non-whitelisted directory are never
//! even listed. Symbolic links are not followed; a link to a regular file is
//! treated as that file, a link to a directory is ignored.
//!
//! The result is sorted by `/`-separated relative path string. All candidates
//! share the root prefix, so this is the same order as sorting the absolute
//! path strings, and it does not depend on the platform's directory order.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{GatherError, GatherResult};
use crate::rules::FilterRules;

/// Number of matches echoed to the debug log after a walk.
const PREVIEW_COUNT: usize = 5;

// ============================================================================
// Candidate Entry
// ============================================================================

/// A file or directory seen during traversal, positioned relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    absolute_path: PathBuf,
    segments: Vec<String>,
    relative_path: String,
    is_dir: bool,
}

impl CandidateEntry {
    /// Build an entry for `path` under `root`.
    ///
    /// Returns `None` if `path` is not inside `root`.
    pub fn new(root: &Path, path: &Path, is_dir: bool) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let relative_path = segments.join("/");

        Some(CandidateEntry {
            absolute_path: path.to_path_buf(),
            segments,
            relative_path,
            is_dir,
        })
    }

    /// Absolute path on disk.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Relative path joined with forward slashes.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// True for the root directory itself.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments below the root (root files have depth 1).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Final path segment, or the empty string for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// First path segment below the root.
    pub fn top_level(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

// ============================================================================
// Walker
// ============================================================================

/// Walks one root directory under a fixed set of rules.
#[derive(Debug, Clone, Copy)]
pub struct PathFilterWalker<'a> {
    root: &'a Path,
    rules: &'a FilterRules,
}

impl<'a> PathFilterWalker<'a> {
    /// Create a walker. `root` should already be canonical.
    pub fn new(root: &'a Path, rules: &'a FilterRules) -> Self {
        PathFilterWalker { root, rules }
    }

    /// Collect every included file, sorted by relative path.
    ///
    /// Fails only when the root itself cannot be listed. Unreadable
    /// directories further down are logged and skipped.
    pub fn collect_files(&self) -> GatherResult<Vec<CandidateEntry>> {
        fs::read_dir(self.root).map_err(|e| GatherError::from_root_io(self.root, e))?;

        let mut files = Vec::new();
        let walk = WalkDir::new(self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.keep_directory(e));

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(self.root_walk_error(err)),
                Err(err) => {
                    warn!("skipping unreadable entry: {}", err);
                    continue;
                }
            };

            if entry.depth() == 0 || entry.file_type().is_dir() {
                continue;
            }
            if !is_regular_or_file_link(&entry) {
                continue;
            }

            let Some(candidate) = CandidateEntry::new(self.root, entry.path(), false) else {
                continue;
            };
            if self.rules.should_skip(&candidate) {
                continue;
            }
            if !self.rules.accepts_file(&candidate) {
                trace!(path = %candidate.relative_path(), "extension not in active set");
                continue;
            }
            files.push(candidate);
        }

        files.sort_by(|a, b| a.relative_path().cmp(b.relative_path()));

        debug!("found {} whitelisted files matching patterns", files.len());
        for file in files.iter().take(PREVIEW_COUNT) {
            debug!("  - {}", file.absolute_path().display());
        }

        Ok(files)
    }

    /// `filter_entry` predicate: prune directories, let everything else through.
    fn keep_directory(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        match CandidateEntry::new(self.root, entry.path(), true) {
            Some(candidate) => !self.rules.should_skip(&candidate),
            None => false,
        }
    }

    fn root_walk_error(&self, err: walkdir::Error) -> GatherError {
        match err.into_io_error() {
            Some(io_err) => GatherError::from_root_io(self.root, io_err),
            None => GatherError::internal(format!(
                "walk of {} failed without an I/O cause",
                self.root.display()
            )),
        }
    }
}

/// Accept regular files and symlinks resolving to regular files.
///
/// Dangling links are accepted so the read failure is reported by the bundler
/// rather than disappearing silently. Directory links, fifos and sockets are
/// rejected.
fn is_regular_or_file_link(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        trace!(path = %entry.path().display(), "not a regular file");
        return false;
    }
    match fs::metadata(entry.path()) {
        Ok(meta) if meta.is_dir() => {
            trace!(path = %entry.path().display(), "symlink to directory not followed");
            false
        }
        Ok(meta) => meta.is_file(),
        Err(_) => true,
    }
}
