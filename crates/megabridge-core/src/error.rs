//! Error types for megatools invocations.
//!
//! Every failure of an invocation is surfaced to the caller as one of these
//! variants. Nothing is retried at this layer.

use std::path::PathBuf;
use thiserror::Error;

use crate::log::ExitStatus;
use crate::progress::strip_severity;

/// Errors that can occur while running the external executable.
#[derive(Debug, Error)]
pub enum MegatoolsError {
    /// The configured binary does not exist, is not executable, or could
    /// not be started.
    #[error("megatools executable not found at {}: {reason}", .path.display())]
    ExecutableNotFound {
        /// The path that was tried
        path: PathBuf,
        /// Why it could not be used
        reason: String,
    },

    /// The external process exited with a nonzero return code.
    #[error("[returnCode {code}] {message}")]
    Mega {
        /// Process return code
        code: i32,
        /// Last captured output line
        message: String,
    },

    /// A caller-supplied progress callback failed.
    #[error("progress callback failed: {0}")]
    Callback(#[source] anyhow::Error),

    /// The process succeeded but printed something this layer could not
    /// interpret (e.g. a version banner without a version number).
    #[error("unexpected megatools output: {0}")]
    UnexpectedOutput(String),

    /// Reading from or waiting on the process failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MegatoolsError {
    /// Create an `ExecutableNotFound` error.
    pub fn executable_not_found(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ExecutableNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build the `Mega` error for a failed exit.
    ///
    /// The message is the last non-empty output line with a leading severity
    /// tag removed, or a generic status message when the process printed
    /// nothing.
    pub fn from_exit(status: &ExitStatus) -> Self {
        let message = status.log.last_non_empty().map_or_else(
            || format!("exited with status {}", status.code),
            |line| strip_severity(line).to_string(),
        );
        Self::Mega {
            code: status.code,
            message,
        }
    }

    /// Return code carried by a `Mega` error.
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Mega { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result type alias for megatools operations.
pub type MegatoolsResult<T> = Result<T, MegatoolsError>;
