//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log configuration is invalid (bad level, directive or format).
    #[error("invalid log configuration: {0}")]
    Config(String),

    /// A global subscriber was already installed, or installation failed.
    #[error("failed to initialize logging: {0}")]
    Init(String),

    /// The log directory could not be prepared.
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
