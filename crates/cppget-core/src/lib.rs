//! Core infrastructure for cppget.
//!
//! This crate provides the whitelist-driven project bundler:
//! - Filter rules (directory/root-file whitelists, extensions, ignore globs)
//! - Pruned, symlink-safe traversal with deterministic ordering
//! - Bundle rendering with delimiter headers and type tags
//! - Layered run configuration
//! - Error types and exit codes
//! - JSON output types for CLI responses

pub mod bundle;
pub mod config;
pub mod digest;
pub mod error;
pub mod output;
pub mod rules;
pub mod tree;
pub mod walker;

pub use bundle::{gather_files, gather_to_file, GatherOptions, GatherReport, IncludedFile};
pub use config::{CliOverrides, ResolvedOptions, RootConfig};
pub use error::{GatherError, GatherResult, OutputErrorCode};
pub use rules::{FilterRules, SkipReason};
pub use walker::{CandidateEntry, PathFilterWalker};
