//! cppget - gather a GDExtension project into one text bundle.
//!
//! This crate provides the CLI binary. The filtering, traversal and bundle
//! format live in `cppget-core`; `cli` holds the reporting helpers the binary
//! calls.

pub mod cli;

// Re-export core types for convenience
pub use cppget_core::config::{CliOverrides, ResolvedOptions};
pub use cppget_core::error::{GatherError, OutputErrorCode};
pub use cppget_core::{GatherOptions, GatherReport};
