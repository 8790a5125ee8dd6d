//! Structured logging driven by the `logging` configuration section.
//!
//! Output is JSON lines unless the destination asks for `pretty`, in which
//! case records are rendered for humans. A `silent` level installs nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use eddie_config::LoggingConfig;
//! use eddie_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_logging(&LoggingConfig::default()))?;
//! tracing::info!(path = ".eddierc", "configuration loaded");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use eddie_config::{LogDestinationKind, LogLevel, LoggingConfig};
use tracing::Dispatch;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging setup derived from a [`LoggingConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum level; `Silent` disables logging.
    pub level: LogLevel,

    /// Where records go.
    pub destination: LogDestinationKind,

    /// File path when `destination` is `File`.
    pub path: Option<PathBuf>,

    /// Whether to output JSON lines.
    pub json_format: bool,

    /// Whether to prefix records with a timestamp.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_logging(&LoggingConfig::default())
    }
}

impl LogConfig {
    /// Build the setup for a resolved `logging` section.
    ///
    /// A missing destination means human-readable output on stdout.
    #[must_use]
    pub fn from_logging(logging: &LoggingConfig) -> Self {
        let (destination, path, json_format) = match &logging.destination {
            Some(destination) => (
                destination.kind,
                destination.path.as_ref().map(PathBuf::from),
                !destination.pretty,
            ),
            None => (LogDestinationKind::Stdout, None, false),
        };

        Self {
            level: logging.level,
            destination,
            path,
            json_format,
            timestamps: logging.enable_timestamps,
        }
    }

    /// Whether any records will be emitted.
    pub fn is_enabled(&self) -> bool {
        self.level != LogLevel::Silent
    }
}

/// Filter directive for a level. `Silent` maps to `off`.
pub fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Silent => "off",
        other => other.as_str(),
    }
}

/// Creates an env filter from a directive string such as `"info"` or
/// `"eddie_config=debug,warn"`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` if the directive does not parse.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| TelemetryError::InvalidConfig(format!("Invalid log filter: {e}")))
}

/// Builds a dispatcher for `config` without installing it.
///
/// Returns `None` when the level is `Silent`.
///
/// # Errors
///
/// Returns an error if the file destination has no path or cannot be opened.
pub fn build_dispatch(config: &LogConfig) -> TelemetryResult<Option<Dispatch>> {
    if !config.is_enabled() {
        return Ok(None);
    }

    let filter = create_env_filter(level_directive(config.level))?;
    let writer = make_writer(config)?;
    let layer = fmt_layer(config, writer).with_filter(filter);

    Ok(Some(Dispatch::new(tracing_subscriber::registry().with(layer))))
}

/// Initializes the global logging subscriber.
///
/// Returns `false` when logging is silenced and nothing was installed.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if a global subscriber is already
/// set, or a destination error from [`build_dispatch`].
pub fn init_logging(config: &LogConfig) -> TelemetryResult<bool> {
    let Some(dispatch) = build_dispatch(config)? else {
        return Ok(false);
    };

    dispatch
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    Ok(true)
}

fn make_writer(config: &LogConfig) -> TelemetryResult<BoxMakeWriter> {
    match config.destination {
        LogDestinationKind::Stdout => Ok(BoxMakeWriter::new(std::io::stdout)),
        LogDestinationKind::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
        LogDestinationKind::File => {
            let path = config.path.as_ref().ok_or_else(|| {
                TelemetryError::InvalidConfig("file destination requires a path".to_string())
            })?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

fn fmt_layer(config: &LogConfig, writer: BoxMakeWriter) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(config.destination != LogDestinationKind::File && !config.json_format);

    match (config.json_format, config.timestamps) {
        (true, true) => layer.json().boxed(),
        (true, false) => layer.json().without_time().boxed(),
        (false, true) => layer.pretty().boxed(),
        (false, false) => layer.pretty().without_time().boxed(),
    }
}
