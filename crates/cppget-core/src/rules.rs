//! Whitelist and pattern rules deciding which entries reach the bundle.
//!
//! A run is governed by one immutable [`FilterRules`] value:
//!
//! - Top-level directory whitelist: only these first path segments are walked
//! - Root filename whitelist: the only files accepted directly under the root
//! - Extension set: deeper files must end with `.<ext>` (case-sensitive)
//! - Ignore globs: shell-style patterns that veto anything they match
//!
//! ## Glob Semantics
//!
//! Ignore globs follow `fnmatch` conventions: `*` may cross `/`, backslash is
//! a literal character, braces are literal, an unclosed `[` is literal, and
//! matching is case-sensitive. Every pattern is
//! checked against both the bare name and the root-relative path, so
//! `test_*.cpp` catches `src/deep/test_io.cpp` and `src/gen/*` catches a
//! whole subtree.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{GatherError, GatherResult};
use crate::walker::CandidateEntry;

/// Top-level directories that may be traversed at all.
pub const INCLUDE_ONLY_DIRS: &[&str] = &["src", "doc_classes", "include"];

/// Files accepted directly under the root.
pub const INCLUDE_ONLY_ROOT_FILES: &[&str] = &["SConstruct", "main.gdextension"];

/// Extension set used when a caller does not supply one.
pub const DEFAULT_EXTENSIONS: &[&str] = &["cpp", "h", "hpp", "py", "gdextension"];

/// Extension set the CLI starts from before merging `--gather` extras.
pub const CLI_EXTENSIONS: &[&str] = &["cpp", "h", "hpp", "gdextension"];

// ============================================================================
// Skip Reasons
// ============================================================================

/// Why an entry was excluded by [`FilterRules::skip_reason`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A file directly under the root that is not whitelisted.
    RootFileNotWhitelisted,
    /// The entry lives under a top-level directory outside the whitelist.
    DirectoryNotWhitelisted { top_level: String },
    /// An ignore glob matched the name or relative path.
    IgnorePatternMatch { pattern: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::RootFileNotWhitelisted => write!(f, "root file not in whitelist"),
            SkipReason::DirectoryNotWhitelisted { top_level } => {
                write!(f, "directory '{}' not in whitelist", top_level)
            }
            SkipReason::IgnorePatternMatch { pattern } => {
                write!(f, "matches ignore pattern '{}'", pattern)
            }
        }
    }
}

// ============================================================================
// Filter Rules
// ============================================================================

/// Immutable filtering rules for one run.
///
/// Construct with [`FilterRules::builder`]; `FilterRules::default()` gives the
/// GDExtension whitelists with [`DEFAULT_EXTENSIONS`] and no ignore globs.
#[derive(Debug, Clone)]
pub struct FilterRules {
    top_level_dirs: BTreeSet<String>,
    root_files: BTreeSet<String>,
    extensions: BTreeSet<String>,
    ignore_patterns: Vec<String>,
    ignore_set: GlobSet,
}

impl Default for FilterRules {
    fn default() -> Self {
        FilterRules {
            top_level_dirs: to_set(INCLUDE_ONLY_DIRS),
            root_files: to_set(INCLUDE_ONLY_ROOT_FILES),
            extensions: to_set(DEFAULT_EXTENSIONS),
            ignore_patterns: Vec::new(),
            ignore_set: GlobSet::empty(),
        }
    }
}

impl FilterRules {
    /// Start building rules from the default whitelists and extensions.
    pub fn builder() -> FilterRulesBuilder {
        FilterRulesBuilder::default()
    }

    /// Whitelisted top-level directory names.
    pub fn top_level_dirs(&self) -> &BTreeSet<String> {
        &self.top_level_dirs
    }

    /// Whitelisted root filenames.
    pub fn root_files(&self) -> &BTreeSet<String> {
        &self.root_files
    }

    /// Active extensions, without the leading dot, in sorted order.
    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    /// Ignore globs in the order they were supplied.
    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore_patterns
    }

    /// Decide whether an entry is excluded, and why.
    ///
    /// The root itself is never skipped. Whitelist checks run first; ignore
    /// globs are consulted only for entries that survive them, and the first
    /// pattern (in supplied order) that matches is reported.
    pub fn skip_reason(&self, entry: &CandidateEntry) -> Option<SkipReason> {
        if entry.is_root() {
            return None;
        }

        if !entry.is_dir() && entry.depth() == 1 {
            if !self.root_files.contains(entry.name()) {
                return Some(SkipReason::RootFileNotWhitelisted);
            }
        } else if let Some(top) = entry.top_level() {
            if !self.top_level_dirs.contains(top) {
                return Some(SkipReason::DirectoryNotWhitelisted {
                    top_level: top.to_string(),
                });
            }
        }

        self.matching_ignore_pattern(entry.name(), &entry.relative_path())
            .map(|pattern| SkipReason::IgnorePatternMatch {
                pattern: pattern.to_string(),
            })
    }

    /// Boolean form of [`skip_reason`](Self::skip_reason).
    ///
    /// Emits one debug event naming the entry and the reason when it skips.
    pub fn should_skip(&self, entry: &CandidateEntry) -> bool {
        match self.skip_reason(entry) {
            Some(reason) => {
                let kind = if entry.is_dir() { "directory" } else { "file" };
                tracing::debug!(
                    path = %entry.absolute_path().display(),
                    kind,
                    "skipping: {}",
                    reason
                );
                true
            }
            None => false,
        }
    }

    /// First ignore pattern matching either the bare name or the relative path.
    pub fn matching_ignore_pattern(&self, name: &str, relative_path: &str) -> Option<&str> {
        if self.ignore_patterns.is_empty() {
            return None;
        }

        let by_name = self.ignore_set.matches(Path::new(name));
        let by_path = self.ignore_set.matches(Path::new(relative_path));

        by_name
            .into_iter()
            .chain(by_path)
            .min()
            .map(|idx| self.ignore_patterns[idx].as_str())
    }

    /// Check whether a filename ends with `.<ext>` for an active extension.
    pub fn matches_extension(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    /// Check whether an entry is a whitelisted file directly under the root.
    pub fn is_root_file(&self, entry: &CandidateEntry) -> bool {
        !entry.is_dir() && entry.depth() == 1 && self.root_files.contains(entry.name())
    }

    /// Final acceptance test for a file that survived [`should_skip`](Self::should_skip).
    pub fn accepts_file(&self, entry: &CandidateEntry) -> bool {
        self.matches_extension(entry.name()) || self.is_root_file(entry)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`FilterRules`].
#[derive(Debug, Clone)]
pub struct FilterRulesBuilder {
    top_level_dirs: BTreeSet<String>,
    root_files: BTreeSet<String>,
    extensions: BTreeSet<String>,
    ignore_patterns: Vec<String>,
}

impl Default for FilterRulesBuilder {
    fn default() -> Self {
        FilterRulesBuilder {
            top_level_dirs: to_set(INCLUDE_ONLY_DIRS),
            root_files: to_set(INCLUDE_ONLY_ROOT_FILES),
            extensions: to_set(DEFAULT_EXTENSIONS),
            ignore_patterns: Vec::new(),
        }
    }
}

impl FilterRulesBuilder {
    /// Replace the top-level directory whitelist.
    pub fn top_level_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.top_level_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the root filename whitelist.
    pub fn root_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the extension set.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        self
    }

    /// Merge additional extensions into the current set.
    pub fn extra_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions.extend(
            extensions
                .into_iter()
                .filter_map(|ext| normalize_extension(ext.as_ref())),
        );
        self
    }

    /// Append ignore globs, keeping their order.
    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compile the ignore globs and freeze the rules.
    pub fn build(self) -> GatherResult<FilterRules> {
        let ignore_set = build_glob_set(&self.ignore_patterns)?;
        Ok(FilterRules {
            top_level_dirs: self.top_level_dirs,
            root_files: self.root_files,
            extensions: self.extensions,
            ignore_patterns: self.ignore_patterns,
            ignore_set,
        })
    }
}

/// Strip whitespace and a leading dot; empty input yields nothing.
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim();
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_string())
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Rewrite an `fnmatch` pattern into equivalent globset syntax.
///
/// `{` and `}` are plain characters, a `[` without a closing `]` is literal,
/// and `^` only negates a class when written as `!`.
fn fnmatch_to_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut glob = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' => glob.push_str("[{]"),
            '}' => glob.push_str("[}]"),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut glob, &chars[i + 1..end]);
                    i = end;
                }
                None => glob.push_str("[[]"),
            },
            c => glob.push(c),
        }
        i += 1;
    }

    glob
}

/// Index of the `]` closing the class opened at `start`, using the
/// `fnmatch` rule that a `]` right after `[` or `[!` is a member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

fn push_class(glob: &mut String, body: &[char]) {
    match body {
        ['^'] => glob.push('^'),
        ['^', rest @ ..] => {
            glob.push('[');
            glob.extend(rest);
            glob.push_str("^]");
        }
        _ => {
            glob.push('[');
            glob.extend(body);
            glob.push(']');
        }
    }
}

/// Build a GlobSet with fnmatch-style options.
///
/// Only patterns with no valid reading, such as the reversed range `[z-a]`,
/// are rejected.
fn build_glob_set(patterns: &[String]) -> GatherResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = GlobBuilder::new(&fnmatch_to_glob(pattern))
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|e| GatherError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        builder.add(glob);
    }

    builder.build().map_err(|e| GatherError::InvalidPattern {
        pattern: "<combined>".to_string(),
        message: e.to_string(),
    })
}
