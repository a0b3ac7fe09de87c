//! CLI-specific error types and mappings.
//!
//! Maps domain errors to exit codes and user-facing messages.

use doctrack_core::{PathError, SettingsError, TrackingError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Argument error (bad identifier, unknown step, ...).
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(_) => 1,
            CliError::Arguments(_) => 2, // EX_USAGE
            CliError::Io(_) => 74,       // EX_IOERR
            CliError::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<TrackingError> for CliError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::InvalidId { .. } => CliError::Arguments(err.to_string()),
            TrackingError::Io { .. } | TrackingError::Persistence { .. } => {
                CliError::Io(err.to_string())
            }
            TrackingError::DuplicateRecord(_)
            | TrackingError::NotFound(_)
            | TrackingError::Serialization(_) => CliError::Core(err.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        CliError::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err.to_string())
    }
}
