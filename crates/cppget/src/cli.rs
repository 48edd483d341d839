//! Command helpers behind the `cppget` binary.
//!
//! `main.rs` parses arguments and owns the process (tracing, exit codes);
//! everything that decides what to print lives here so it can be tested
//! without spawning the binary.
//!
//! ## Output Contract
//!
//! - Text mode prints one line on stdout: the success message or the
//!   no-match hint. Errors go to stderr as `error: <message>`.
//! - JSON mode prints exactly one JSON document on stdout, whether the run
//!   succeeded, found nothing, or failed.

use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use cppget_core::error::{GatherError, GatherResult, OutputErrorCode};
use cppget_core::output::{emit_response, ErrorResponse, GatherResponse};
use cppget_core::{gather_to_file, GatherReport, ResolvedOptions};

/// Printed when nothing made it into the bundle.
pub const NO_MATCHES_MESSAGE: &str =
    "No matching files found in the whitelist. Check paths and try --debug for more information.";

/// How results are reported on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line.
    #[default]
    Text,
    /// A `GatherResponse` or `ErrorResponse` document.
    Json,
}

/// Gather `project_dir` into its bundle using already-resolved options.
///
/// Glob errors surface before the root is touched, and the root is
/// validated before the output file is created.
pub fn run_gather(project_dir: &Path, options: &ResolvedOptions) -> GatherResult<GatherReport> {
    let rules = options.filter_rules()?;
    let config = options.root_config(project_dir)?;
    gather_to_file(&config, &rules, &options.gather_options())
}

/// The line printed after a successful run.
pub fn success_message(output_file: &Path) -> String {
    format!("Whitelisted files gathered into {}", output_file.display())
}

/// Exit status for a finished run: success only if something was written.
pub fn report_exit_code(report: &GatherReport) -> u8 {
    if report.is_success() {
        0
    } else {
        OutputErrorCode::NoMatches.code()
    }
}

/// Print the outcome of a finished run.
pub fn write_report(
    report: &GatherReport,
    format: OutputFormat,
    out: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => emit_response(&GatherResponse::from_report(report), out),
        OutputFormat::Text if report.is_success() => {
            writeln!(out, "{}", success_message(&report.output_file))
        }
        OutputFormat::Text => writeln!(out, "{}", NO_MATCHES_MESSAGE),
    }
}

/// Print a fatal error.
///
/// Text goes to `err`; JSON goes to `out` so consumers only read one stream.
pub fn write_error(
    error: &GatherError,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => emit_response(&ErrorResponse::new(error), out),
        OutputFormat::Text => writeln!(err, "error: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cppget_core::config::CliOverrides;
    use cppget_core::digest::ContentHash;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn report(included: &[&str]) -> GatherReport {
        GatherReport {
            project_name: "gecs".to_string(),
            root_dir: PathBuf::from("/work/gecs"),
            output_file: PathBuf::from("gecs-project.txt"),
            files_processed: included.len(),
            files_included: included.len(),
            read_failures: 0,
            bytes_written: 0,
            digest: ContentHash::compute(b""),
            included: included.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn bad_pattern() -> GatherError {
        GatherError::InvalidPattern {
            pattern: "[z-a]".to_string(),
            message: "invalid range".to_string(),
        }
    }

    fn options(overrides: CliOverrides) -> ResolvedOptions {
        ResolvedOptions::resolve_with_env(&overrides, |_| None)
    }

    mod messages {
        use super::*;

        #[test]
        fn success_names_output_file() {
            let mut buf = Vec::new();
            write_report(&report(&["SConstruct"]), OutputFormat::Text, &mut buf).unwrap();
            assert_eq!(
                String::from_utf8(buf).unwrap(),
                "Whitelisted files gathered into gecs-project.txt\n"
            );
        }

        #[test]
        fn empty_run_prints_hint() {
            let mut buf = Vec::new();
            write_report(&report(&[]), OutputFormat::Text, &mut buf).unwrap();
            assert_eq!(
                String::from_utf8(buf).unwrap(),
                format!("{}\n", NO_MATCHES_MESSAGE)
            );
        }

        #[test]
        fn json_report_is_parseable() {
            let mut buf = Vec::new();
            write_report(&report(&["src/a.cpp"]), OutputFormat::Json, &mut buf).unwrap();
            let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
            assert_eq!(value["status"], "ok");
            assert_eq!(value["files"][0], "src/a.cpp");
        }

        #[test]
        fn text_error_goes_to_stderr() {
            let error = bad_pattern();
            let (mut out, mut err) = (Vec::new(), Vec::new());
            write_error(&error, OutputFormat::Text, &mut out, &mut err).unwrap();
            assert!(out.is_empty());
            assert_eq!(
                String::from_utf8(err).unwrap(),
                "error: invalid glob pattern '[z-a]': invalid range\n"
            );
        }

        #[test]
        fn json_error_goes_to_stdout() {
            let error = bad_pattern();
            let (mut out, mut err) = (Vec::new(), Vec::new());
            write_error(&error, OutputFormat::Json, &mut out, &mut err).unwrap();
            assert!(err.is_empty());
            let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
            assert_eq!(value["status"], "error");
            assert_eq!(value["error"]["code"], 2);
        }

        #[test]
        fn exit_code_tracks_success() {
            assert_eq!(report_exit_code(&report(&["SConstruct"])), 0);
            assert_eq!(report_exit_code(&report(&[])), 1);
        }
    }

    mod gather {
        use super::*;

        #[test]
        fn writes_bundle_to_override() {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("gecs");
            fs::create_dir_all(root.join("src")).unwrap();
            fs::write(root.join("src/world.cpp"), "int world;").unwrap();
            let output = temp.path().join("out.txt");

            let report = run_gather(
                &root,
                &options(CliOverrides {
                    output_file: Some(output.clone()),
                    ..Default::default()
                }),
            )
            .unwrap();

            assert_eq!(report.included, vec!["src/world.cpp"]);
            assert_eq!(report.output_file, output);
            assert!(fs::read_to_string(&output).unwrap().contains("int world;"));
        }

        #[test]
        fn bad_glob_fails_before_output_is_created() {
            let temp = TempDir::new().unwrap();
            let output = temp.path().join("out.txt");

            let err = run_gather(
                temp.path(),
                &options(CliOverrides {
                    ignore_patterns: vec!["src/[z-a].cpp".to_string()],
                    output_file: Some(output.clone()),
                    ..Default::default()
                }),
            )
            .unwrap_err();

            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
            assert!(!output.exists());
        }

        #[test]
        fn missing_root_is_root_error() {
            let temp = TempDir::new().unwrap();
            let err = run_gather(&temp.path().join("nope"), &options(CliOverrides::default()))
                .unwrap_err();
            assert_eq!(err.error_code(), OutputErrorCode::RootError);
        }
    }
}
