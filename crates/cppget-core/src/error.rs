//! Error types and exit code constants for cppget.
//!
//! Only conditions that make a run meaningless are errors here. Per-file read
//! failures are recovered inside the bundler and whitelist mismatches are
//! ordinary filtering outcomes, so neither appears in this enum.
//!
//! ## Exit Code Mapping
//!
//! - `1`: Run completed but no file matched the whitelist
//! - `2`: Invalid arguments (bad glob, bad option value)
//! - `3`: Root directory missing, not a directory, or unreadable
//! - `4`: Output bundle could not be written
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Process exit codes used by the CLI and reported in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// The run finished but produced an empty bundle.
    NoMatches = 1,
    /// Invalid arguments from caller (bad pattern, malformed option).
    InvalidArguments = 2,
    /// Root directory could not be resolved or read.
    RootError = 3,
    /// The output bundle could not be written.
    OutputError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Fatal errors for a gather run.
#[derive(Debug, Error)]
pub enum GatherError {
    /// An ignore pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The root directory does not exist.
    #[error("root directory not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    /// The root path exists but is not a directory.
    #[error("root path is not a directory: {}", path.display())]
    RootNotDirectory { path: PathBuf },

    /// The root directory exists but cannot be listed.
    #[error("root directory unreadable: {}: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the bundle failed.
    #[error("failed to write bundle {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

/// Result type for gather operations.
pub type GatherResult<T> = Result<T, GatherError>;

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&GatherError> for OutputErrorCode {
    fn from(err: &GatherError) -> Self {
        match err {
            GatherError::InvalidPattern { .. } => OutputErrorCode::InvalidArguments,
            GatherError::RootNotFound { .. } => OutputErrorCode::RootError,
            GatherError::RootNotDirectory { .. } => OutputErrorCode::RootError,
            GatherError::RootUnreadable { .. } => OutputErrorCode::RootError,
            GatherError::Output { .. } => OutputErrorCode::OutputError,
            GatherError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<GatherError> for OutputErrorCode {
    fn from(err: GatherError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl GatherError {
    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        GatherError::InternalError {
            message: message.into(),
        }
    }

    /// Classify an I/O error raised while opening the root directory.
    pub fn from_root_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => GatherError::RootNotFound { path },
            _ => GatherError::RootUnreadable { path, source },
        }
    }

    /// Wrap an I/O error raised while writing the bundle.
    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GatherError::Output {
            path: path.into(),
            source,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
