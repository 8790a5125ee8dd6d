//! Logging setup for Eddie.
//!
//! Turns the `logging` section of a resolved configuration into a global
//! `tracing` subscriber: level filter, destination (stdout, stderr or a file),
//! JSON lines or human-readable output, and optional timestamps.
//!
//! ```rust,ignore
//! use eddie_config::ResolvedConfig;
//! use eddie_telemetry::{init_logging, LogConfig};
//!
//! let config = ResolvedConfig::default();
//! init_logging(&LogConfig::from_logging(&config.logging))?;
//!
//! tracing::info!(model = %config.model, "configuration loaded");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, level_directive, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
