//! Binary entry point for the cppget CLI.
//!
//! Collects the whitelisted parts of a GDExtension project into a single
//! `<project>-project.txt` bundle for pasting into an LLM session.
//!
//! ## Usage
//!
//! ```bash
//! # Bundle sources, headers, SConstruct and main.gdextension
//! cppget ~/dev/gecs
//!
//! # Also take shaders and doc XML, skip generated bindings
//! cppget ~/dev/gecs --gather glsl xml --ignore 'gen_*' 'src/thirdparty/*'
//!
//! # Machine-readable summary
//! cppget ~/dev/gecs --format json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cppget::cli::{report_exit_code, run_gather, write_error, write_report, OutputFormat};
use cppget_core::config::{CliOverrides, ResolvedOptions};
use cppget_core::error::GatherError;

// ============================================================================
// CLI Structure
// ============================================================================

/// Gather a Godot GDExtension project into one text file.
///
/// Only `src/`, `doc_classes/`, `include/` and the root files `SConstruct`
/// and `main.gdextension` are considered. Files are written in path order,
/// each under a delimiter header naming its path and type.
#[derive(Parser, Debug)]
#[command(
    name = "cppget",
    version,
    about = "Gather whitelisted GDExtension project files into one text bundle"
)]
struct Cli {
    /// Root directory of the project.
    project_dir: PathBuf,

    /// Additional extensions to gather (e.g. glsl xml).
    #[arg(long, value_name = "EXT", num_args = 1..)]
    gather: Vec<String>,

    /// Glob patterns to ignore, matched against names and relative paths.
    #[arg(long, value_name = "GLOB", num_args = 1..)]
    ignore: Vec<String>,

    /// Log configuration, skipped paths and a file preview to stderr.
    #[arg(long)]
    debug: bool,

    /// Write files whose content is empty after trimming.
    #[arg(long)]
    include_empty: bool,

    /// Append an indented tree of the included paths.
    #[arg(long)]
    tree: bool,

    /// Write the bundle here instead of `<project>-project.txt`.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// How to report the result on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log level (ignored when RUST_LOG is set).
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

impl Cli {
    /// Flags the user actually passed, for layering over env and defaults.
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            extra_extensions: self.gather.clone(),
            ignore_patterns: self.ignore.clone(),
            debug: self.debug.then_some(true),
            include_empty: self.include_empty.then_some(true),
            append_tree: self.tree.then_some(true),
            output_file: self.output.clone(),
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = ResolvedOptions::resolve(&cli.overrides());

    init_tracing(&log_directives(
        cli.log_level,
        options.debug.value,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    ));
    for warning in &options.warnings {
        tracing::warn!("{}", warning);
    }

    match run_gather(&cli.project_dir, &options) {
        Ok(report) => {
            let mut stdout = io::stdout();
            if let Err(e) = write_report(&report, cli.format, &mut stdout) {
                tracing::error!("failed to write report: {}", e);
            }
            let _ = stdout.flush();
            ExitCode::from(report_exit_code(&report))
        }
        Err(err) => fail(&err, cli.format),
    }
}

/// Report a fatal error and map it to its exit code.
fn fail(err: &GatherError, format: OutputFormat) -> ExitCode {
    let mut stdout = io::stdout();
    let _ = write_error(err, format, &mut stdout, &mut io::stderr());
    let _ = stdout.flush();
    ExitCode::from(err.error_code().code())
}

/// Filter directives for this run.
///
/// Debug mode always logs at `debug`; otherwise a non-empty `RUST_LOG` wins
/// over `--log-level`.
fn log_directives(level: LogLevel, debug: bool, rust_log: Option<String>) -> String {
    if debug {
        return tracing::Level::DEBUG.to_string();
    }
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => level.to_tracing_level().to_string(),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(directives: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
