//! Load / write orchestration.
//!
//! [`ConfigService`] runs the whole pipeline (locate, read, parse, migrate,
//! compose, validate) and is the single writer of its [`SnapshotStore`].
//! Successful writes and reloads are also broadcast as [`ConfigFileSnapshot`]s
//! for hot-reload transports.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::defaults::default_config_for;
use crate::input::{CliOverrides, RawConfigInput};
use crate::loader::{
    read_config_file, resolve_config_path, resolve_write_target, write_config_file, ConfigPaths,
};
use crate::migration::{MigrationResult, Migrator};
use crate::snapshot::SnapshotStore;
use crate::source::{parse_source, serialize_input, ConfigFormat};
use crate::{compose, validate, ConfigError, ResolvedConfig};

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Result of one read or write: the file as found plus what it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFileSnapshot {
    /// File the content came from or went to; `None` when no file exists.
    pub path: Option<PathBuf>,
    /// Format of `content`.
    pub format: ConfigFormat,
    /// Source text.
    pub content: String,
    /// Parsed input, migrated to the current version when migration
    /// succeeded.
    pub input: RawConfigInput,
    /// Resolved configuration; `None` if the pipeline failed.
    pub config: Option<ResolvedConfig>,
    /// Failure message when `config` is `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Migration warnings, in the order the steps ran.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Builder for [`ConfigService`].
#[derive(Debug)]
pub struct ConfigServiceBuilder {
    paths: ConfigPaths,
    overrides: CliOverrides,
    defaults: Option<ResolvedConfig>,
    migrator: Migrator,
}

impl ConfigServiceBuilder {
    /// Start from the given search roots.
    #[must_use]
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            overrides: CliOverrides::default(),
            defaults: None,
            migrator: Migrator::standard(),
        }
    }

    /// Set the CLI / environment override layer.
    #[must_use]
    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replace the built-in baseline.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ResolvedConfig) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Replace the migration chain.
    #[must_use]
    pub fn with_migrator(mut self, migrator: Migrator) -> Self {
        self.migrator = migrator;
        self
    }

    /// Build the service. The store starts out holding the defaults.
    #[must_use]
    pub fn build(self) -> ConfigService {
        let defaults = self
            .defaults
            .unwrap_or_else(|| default_config_for(self.paths.cwd.to_string_lossy()));
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        ConfigService {
            store: SnapshotStore::new(defaults.clone()),
            paths: self.paths,
            overrides: self.overrides,
            defaults,
            migrator: self.migrator,
            changes,
            last_path: Mutex::new(None),
        }
    }
}

/// Runs the configuration pipeline and owns the live snapshot.
///
/// # Example
///
/// ```no_run
/// use eddie_config::{ConfigPaths, ConfigService};
///
/// # async fn example() -> Result<(), eddie_config::ConfigError> {
/// let service = ConfigService::builder(ConfigPaths::from_env()?).build();
/// let loaded = service.load().await?;
/// for warning in &loaded.warnings {
///     eprintln!("{warning}");
/// }
/// println!("model: {}", service.store().get_snapshot().model);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigService {
    paths: ConfigPaths,
    overrides: CliOverrides,
    defaults: ResolvedConfig,
    migrator: Migrator,
    store: SnapshotStore<ResolvedConfig>,
    changes: broadcast::Sender<ConfigFileSnapshot>,
    last_path: Mutex<Option<PathBuf>>,
}

impl ConfigService {
    /// Start building a service over `paths`.
    #[must_use]
    pub fn builder(paths: ConfigPaths) -> ConfigServiceBuilder {
        ConfigServiceBuilder::new(paths)
    }

    /// The live snapshot store.
    pub fn store(&self) -> &SnapshotStore<ResolvedConfig> {
        &self.store
    }

    /// Search roots in use.
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Override layer in use.
    pub fn overrides(&self) -> &CliOverrides {
        &self.overrides
    }

    /// Path of the file most recently loaded or written.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.last_path.lock().clone()
    }

    /// Receive every snapshot published by [`write_source`](Self::write_source)
    /// and [`reload`](Self::reload).
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ConfigFileSnapshot> {
        self.changes.subscribe()
    }

    /// Migrate, compose and validate an input against this service's
    /// defaults and overrides. Pure; publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns migration errors and [`ConfigError::ValidationFailed`].
    pub fn compose_input(
        &self,
        input: RawConfigInput,
    ) -> Result<(MigrationResult, ResolvedConfig), ConfigError> {
        let migrated = self.migrator.migrate(input)?;
        let config = compose(&self.defaults, &migrated.input, &self.overrides);
        validate(&config)?;
        Ok((migrated, config))
    }

    /// Locate, read and resolve the config file, then publish the result to
    /// the store. No file at all yields the defaults plus overrides.
    ///
    /// # Errors
    ///
    /// Any failure along the pipeline is returned; the store keeps its
    /// previous snapshot.
    pub async fn load(&self) -> Result<ConfigFileSnapshot, ConfigError> {
        let path = resolve_config_path(self.overrides.config.as_deref(), &self.paths).await?;
        self.load_from(path).await
    }

    /// Re-run [`load`](Self::load) against the file loaded last, and
    /// broadcast the outcome.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub async fn reload(&self) -> Result<ConfigFileSnapshot, ConfigError> {
        let existing = match self.current_path() {
            Some(path) if tokio::fs::try_exists(&path).await.unwrap_or(false) => Some(path),
            _ => None,
        };
        let snapshot = match existing {
            Some(path) => self.load_from(Some(path)).await?,
            None => self.load().await?,
        };
        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    /// Read the current file for display or editing.
    ///
    /// Unlike [`load`](Self::load), parse, migration and validation failures
    /// are captured in the snapshot's `error` field. Nothing is published.
    ///
    /// # Errors
    ///
    /// Only path resolution and I/O failures are returned.
    pub async fn read_snapshot(&self) -> Result<ConfigFileSnapshot, ConfigError> {
        let path = resolve_config_path(self.overrides.config.as_deref(), &self.paths).await?;
        let (format, content) = self.read_text(path.as_deref()).await?;

        let input = match parse_source(&content, format) {
            Ok(input) => input,
            Err(e) => {
                return Ok(ConfigFileSnapshot {
                    path,
                    format,
                    content,
                    input: RawConfigInput::default(),
                    config: None,
                    error: Some(e.to_string()),
                    warnings: Vec::new(),
                })
            }
        };

        let snapshot = match self.compose_input(input.clone()) {
            Ok((migrated, config)) => ConfigFileSnapshot {
                path,
                format,
                content,
                input: migrated.input,
                config: Some(config),
                error: None,
                warnings: migrated.warnings,
            },
            Err(e) => ConfigFileSnapshot {
                path,
                format,
                content,
                input,
                config: None,
                error: Some(e.to_string()),
                warnings: Vec::new(),
            },
        };
        Ok(snapshot)
    }

    /// Validate and persist new source text, then publish it.
    ///
    /// `format` is the format of `content` and defaults to the target's
    /// detected format. `target`, when given, is confined to the config root;
    /// otherwise the file loaded last is overwritten, or a new
    /// `eddie.config.*` is created in the config root. The migrated input is
    /// what gets written, always in the format the target's name implies so
    /// the loader reads it back the same way.
    ///
    /// # Errors
    ///
    /// Parse, migration, validation and containment failures are returned
    /// before anything is written.
    pub async fn write_source(
        &self,
        content: &str,
        format: Option<ConfigFormat>,
        target: Option<&Path>,
    ) -> Result<ConfigFileSnapshot, ConfigError> {
        let path = match target {
            Some(target) => resolve_write_target(target, &self.paths)?,
            None => match self.current_path() {
                Some(path) => path,
                None => self
                    .paths
                    .default_target(format.unwrap_or_default()),
            },
        };
        let stored = ConfigFormat::from_path(&path);

        let input = parse_source(content, format.unwrap_or(stored))?;
        let (migrated, config) = self.compose_input(input)?;
        self.persist(path, stored, migrated, config).await
    }

    /// Show what the config file looks like at the current schema version
    /// without writing it. `None` when no config file exists.
    ///
    /// The result's `content` is the upgraded text. Composition and
    /// validation failures are captured in `error`, since the upgrade itself
    /// does not depend on them.
    ///
    /// # Errors
    ///
    /// Returns path resolution, I/O, parse and migration failures.
    pub async fn preview_migration(&self) -> Result<Option<ConfigFileSnapshot>, ConfigError> {
        let Some((path, format, migrated)) = self.read_migrated().await? else {
            return Ok(None);
        };

        let content = serialize_input(&migrated.input, format)?;
        let config = compose(&self.defaults, &migrated.input, &self.overrides);
        let (config, error) = match validate(&config) {
            Ok(()) => (Some(config), None),
            Err(errors) => (None, Some(ConfigError::from(errors).to_string())),
        };

        Ok(Some(ConfigFileSnapshot {
            path: Some(path),
            format,
            content,
            input: migrated.input,
            config,
            error,
            warnings: migrated.warnings,
        }))
    }

    /// Upgrade the config file in place to the current schema version and
    /// publish the result. `None` when no config file exists.
    ///
    /// # Errors
    ///
    /// Parse, migration and validation failures are returned before
    /// anything is written.
    pub async fn migrate_file(&self) -> Result<Option<ConfigFileSnapshot>, ConfigError> {
        let Some((path, format, migrated)) = self.read_migrated().await? else {
            return Ok(None);
        };

        let config = compose(&self.defaults, &migrated.input, &self.overrides);
        validate(&config)?;
        self.persist(path, format, migrated, config).await.map(Some)
    }

    async fn read_migrated(
        &self,
    ) -> Result<Option<(PathBuf, ConfigFormat, MigrationResult)>, ConfigError> {
        let Some(path) =
            resolve_config_path(self.overrides.config.as_deref(), &self.paths).await?
        else {
            return Ok(None);
        };
        let (format, content) = self.read_text(Some(path.as_path())).await?;
        let migrated = self.migrator.migrate(parse_source(&content, format)?)?;
        Ok(Some((path, format, migrated)))
    }

    // Write the migrated input, then publish and broadcast it.
    async fn persist(
        &self,
        path: PathBuf,
        format: ConfigFormat,
        migrated: MigrationResult,
        config: ResolvedConfig,
    ) -> Result<ConfigFileSnapshot, ConfigError> {
        let serialized = serialize_input(&migrated.input, format)?;

        write_config_file(&path, &serialized).await?;
        tracing::info!(path = %path.display(), %format, "wrote configuration");
        *self.last_path.lock() = Some(path.clone());

        self.store.set_snapshot(config.clone());
        let snapshot = ConfigFileSnapshot {
            path: Some(path),
            format,
            content: serialized,
            input: migrated.input,
            config: Some(config),
            error: None,
            warnings: migrated.warnings,
        };
        self.broadcast(&snapshot);
        Ok(snapshot)
    }

    async fn load_from(&self, path: Option<PathBuf>) -> Result<ConfigFileSnapshot, ConfigError> {
        let (format, content) = self.read_text(path.as_deref()).await?;
        let input = parse_source(&content, format)?;
        let (migrated, config) = self.compose_input(input)?;

        for warning in &migrated.warnings {
            tracing::warn!(path = ?path, "{warning}");
        }

        *self.last_path.lock() = path.clone();
        if self.store.set_snapshot(config.clone()) {
            tracing::info!(path = ?path, model = %config.model, "configuration updated");
        }

        Ok(ConfigFileSnapshot {
            path,
            format,
            content,
            input: migrated.input,
            config: Some(config),
            error: None,
            warnings: migrated.warnings,
        })
    }

    async fn read_text(&self, path: Option<&Path>) -> Result<(ConfigFormat, String), ConfigError> {
        match path {
            Some(path) => Ok((ConfigFormat::from_path(path), read_config_file(path).await?)),
            None => Ok((ConfigFormat::default(), String::new())),
        }
    }

    fn broadcast(&self, snapshot: &ConfigFileSnapshot) {
        if self.changes.send(snapshot.clone()).is_err() {
            tracing::trace!("no change subscribers");
        }
    }
}
