//! Exit codes and structured error output.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: the command completed (and, for scans, at least one video matched)
/// - 1: unexpected failure
/// - 2: the scan completed but no video passed the filters
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The scan matched no videos.
    NoVideos = 2,
    /// Interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code used in JSON output.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RV000",
            Self::GeneralError => "RV001",
            Self::NoVideos => "RV002",
            Self::Interrupted => "RV130",
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Machine-readable code (e.g. "RV001")
    pub code: String,
    /// Numeric exit code
    pub exit_code: i32,
    /// Human-readable message, including the cause chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report from an error and the exit code it maps to.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
