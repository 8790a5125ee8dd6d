//! Configuration composition and validation for the Eddie control plane.
//!
//! This crate resolves one authoritative [`ResolvedConfig`] from three layers
//! and keeps it available as a live, observable snapshot:
//!
//! 1. Built-in defaults ([`defaults`])
//! 2. An on-disk YAML or JSON file, upgraded by the [`Migrator`]
//! 3. Command-line / environment overrides ([`CliOverrides`])
//!
//! The core is synchronous and pure: [`migrate`], [`compose`] and
//! [`validate`]. [`SnapshotStore`] holds the latest valid configuration and
//! notifies subscribers on real change. [`ConfigService`] wires the core to
//! the file boundary ([`resolve_config_path`], [`parse_source`],
//! [`serialize_input`]) and [`FileWatcher`] drives hot reload.
//!
//! # Example
//!
//! ```
//! use eddie_config::{
//!     compose, migrate, parse_source, validate, CliOverrides, ConfigFormat, LogLevel,
//!     ResolvedConfig,
//! };
//!
//! # fn main() -> Result<(), eddie_config::ConfigError> {
//! let raw = parse_source(
//!     "model: file-model\nlogging:\n  level: warn\n",
//!     ConfigFormat::Yaml,
//! )?;
//! let migrated = migrate(raw)?;
//!
//! let cli = CliOverrides {
//!     model: Some("cli-model".to_string()),
//!     log_level: Some(LogLevel::Error),
//!     ..Default::default()
//! };
//! let config = compose(&ResolvedConfig::default(), &migrated.input, &cli);
//! validate(&config)?;
//!
//! assert_eq!(config.model, "cli-model");
//! assert_eq!(config.logging.level, LogLevel::Error);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```yaml
//! version: 2
//! model: gpt-4o-mini
//! provider:
//!   name: openai
//! providers:
//!   local:
//!     provider:
//!       name: ollama
//!       baseUrl: http://localhost:11434
//!     model: llama3
//! context:
//!   include: ["src/**/*"]
//!   maxFiles: 64
//! logging:
//!   level: info
//!   destination:
//!     type: file
//!     path: .eddie/eddie.log
//! tools:
//!   sources:
//!     - id: docs
//!       type: mcp
//!       url: http://localhost:7000/mcp
//!       auth:
//!         type: bearer
//!         token: secret
//! agents:
//!   mode: router
//!   subagents:
//!     - id: reviewer
//!       provider: local
//! ```

#![warn(missing_docs)]

mod compose;
mod config;
pub mod defaults;
mod error;
mod input;
mod loader;
mod migration;
mod schema;
mod service;
mod snapshot;
mod source;
mod validate;
mod watcher;

pub use compose::compose;
pub use config::ResolvedConfig;
pub use error::{ConfigError, ValidationErrors, ValidationIssue};
pub use input::*;
pub use loader::{
    read_config_file, resolve_config_path, resolve_write_target, write_config_file, ConfigPaths,
    CONFIG_DIR_ENV, CONFIG_FILENAMES,
};
pub use migration::{migrate, MigrationFn, MigrationResult, MigrationStep, Migrator};
pub use schema::*;
pub use service::{ConfigFileSnapshot, ConfigService, ConfigServiceBuilder};
pub use snapshot::{SnapshotStore, Subscription};
pub use source::{parse_source, serialize_input, ConfigFormat};
pub use validate::validate;
pub use watcher::{FileChangeEvent, FileChangeKind, FileWatcher, FileWatcherBuilder, FileWatcherConfig};
