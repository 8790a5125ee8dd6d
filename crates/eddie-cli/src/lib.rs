//! Command-line front end for Eddie configuration.
//!
//! The binary parses flags and `EDDIE_*` variables into
//! [`CliOverrides`](eddie_config::CliOverrides), installs logging from the
//! resolved `logging` section, then runs one of the [`Command`]s against a
//! [`ConfigService`].
//!
//! ```text
//! eddie show --format json
//! eddie --model gpt-4o check
//! eddie migrate --write
//! eddie watch --debounce-ms 500
//! ```

#![warn(missing_docs)]

pub mod args;
pub mod commands;

use eddie_config::{compose, ConfigService, LogDestinationKind, RawConfigInput};
use eddie_telemetry::LogConfig;

pub use args::{Cli, Command, OverrideArgs};
pub use commands::{run, Status};

/// Logging setup for this session, taken from the config file when it
/// resolves and from defaults plus overrides otherwise.
///
/// Records meant for stdout go to stderr so command output stays parseable.
pub async fn log_config(service: &ConfigService) -> LogConfig {
    let logging = match service.read_snapshot().await {
        Ok(snapshot) => snapshot.config.map(|config| config.logging),
        Err(_) => None,
    }
    .unwrap_or_else(|| {
        compose(
            &service.store().get_snapshot(),
            &RawConfigInput::default(),
            service.overrides(),
        )
        .logging
    });

    let mut config = LogConfig::from_logging(&logging);
    if config.destination == LogDestinationKind::Stdout {
        config.destination = LogDestinationKind::Stderr;
    }
    config
}
