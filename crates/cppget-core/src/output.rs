//! JSON output types for `--format json`.
//!
//! Every response has `status` as its first field and carries
//! `schema_version` so consumers can detect incompatible changes. Field order
//! and array order are deterministic.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::bundle::GatherReport;
use crate::error::{GatherError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatherResponse {
    /// `ok` when at least one file was written, otherwise `empty`.
    pub status: String,
    pub schema_version: String,
    pub project: String,
    pub root: String,
    pub output_file: String,
    pub files_processed: usize,
    pub files_included: usize,
    pub read_failures: usize,
    pub bytes_written: u64,
    /// SHA-256 of the bundle, hex-encoded.
    pub digest: String,
    /// Included relative paths, in bundle order.
    pub files: Vec<String>,
}

impl GatherResponse {
    pub fn from_report(report: &GatherReport) -> Self {
        GatherResponse {
            status: (if report.is_success() { "ok" } else { "empty" }).to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            project: report.project_name.clone(),
            root: report.root_dir.display().to_string(),
            output_file: report.output_file.display().to_string(),
            files_processed: report.files_processed,
            files_included: report.files_included,
            read_failures: report.read_failures,
            bytes_written: report.bytes_written,
            digest: report.digest.0.clone(),
            files: report.included.clone(),
        }
    }
}

/// Error details in a JSON error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, identical to the process exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Create from a GatherError.
    pub fn from_error(err: &GatherError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Response emitted when a run fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(err: &GatherError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
