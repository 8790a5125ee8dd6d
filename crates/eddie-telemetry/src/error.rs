//! Error types for telemetry setup.

use thiserror::Error;

/// Errors that can occur while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Invalid logging configuration.
    #[error("Invalid logging configuration: {0}")]
    InvalidConfig(String),

    /// I/O error while opening a log destination.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
