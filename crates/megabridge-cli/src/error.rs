//! CLI-specific error types and mappings.
//!
//! Maps [`MegatoolsError`] onto process exit codes and user-facing
//! messages.

use megabridge_core::MegatoolsError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// megatools ran and failed.
    #[error("{message}")]
    Mega { code: i32, message: String },

    /// No runnable megatools binary.
    #[error("{0}")]
    ExecutableNotFound(String),

    /// IO error (broken pipe, failed wait, etc.).
    #[error("IO error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// - 1..=255: megatools' own exit code, passed through
    /// - 74: IO error (`EX_IOERR`)
    /// - 127: executable not found, as a shell reports it
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Mega { code, .. } => u8::try_from((*code).clamp(1, 255)).unwrap_or(1),
            Self::ExecutableNotFound(_) => 127,
            Self::Io(_) => 74,
            Self::Other(_) => 1,
        }
    }
}

impl From<MegatoolsError> for CliError {
    fn from(err: MegatoolsError) -> Self {
        match err {
            MegatoolsError::Mega { code, .. } => Self::Mega {
                code,
                message: err.to_string(),
            },
            MegatoolsError::ExecutableNotFound { .. } => Self::ExecutableNotFound(err.to_string()),
            MegatoolsError::Io(io_err) => Self::Io(io_err.to_string()),
            MegatoolsError::Callback(_) | MegatoolsError::UnexpectedOutput(_) => {
                Self::Other(err.to_string())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(format!("Failed to render JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mega_error_passes_code_through() {
        let err = CliError::from(MegatoolsError::Mega {
            code: 42,
            message: "Network is unreachable".to_string(),
        });
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.to_string(), "[returnCode 42] Network is unreachable");
    }

    #[test]
    fn test_signal_and_overflow_codes_are_clamped() {
        let killed = CliError::Mega {
            code: -9,
            message: String::new(),
        };
        assert_eq!(killed.exit_code(), 1);

        let large = CliError::Mega {
            code: 300,
            message: String::new(),
        };
        assert_eq!(large.exit_code(), 255);
    }

    #[test]
    fn test_exit_codes() {
        let not_found = CliError::from(MegatoolsError::executable_not_found(
            "/nope/megatools",
            "does not exist",
        ));
        assert_eq!(not_found.exit_code(), 127);
        assert_eq!(
            CliError::from(std::io::Error::other("broken pipe")).exit_code(),
            74
        );
    }
}
