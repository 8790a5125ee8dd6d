//! File watching for configuration hot-reload.
//!
//! [`FileWatcher`] wraps a `notify` watcher and turns raw filesystem events
//! into debounced [`FileChangeEvent`]s. Editors usually save by writing a
//! temporary file and renaming it over the original, so the usual setup is to
//! watch the config file's directory and filter on its file name:
//!
//! ```no_run
//! use eddie_config::{ConfigPaths, ConfigService, FileWatcher};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), eddie_config::ConfigError> {
//! let service = ConfigService::builder(ConfigPaths::from_env()?).build();
//! let loaded = service.load().await?;
//!
//! if let Some(path) = loaded.path {
//!     let mut watcher = FileWatcher::builder()
//!         .with_debounce(Duration::from_millis(250))
//!         .watch_file(&path)?
//!         .build()?;
//!
//!     while let Some(_event) = watcher.next().await {
//!         if let Err(error) = service.reload().await {
//!             eprintln!("reload failed, keeping previous config: {error}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::ConfigError;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// A debounced change to a watched file.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// Path to the changed file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: FileChangeKind,
    /// When the change was seen.
    pub timestamp: Instant,
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// File was created (including renamed into place).
    Created,
    /// File contents or metadata changed.
    Modified,
    /// File was deleted.
    Deleted,
}

impl FileChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Deleted),
            EventKind::Access(_) | EventKind::Other | EventKind::Any => None,
        }
    }
}

/// Settings for a [`FileWatcher`].
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Files or directories to watch.
    pub paths: Vec<PathBuf>,
    /// Changes to the same path within this window are coalesced.
    pub debounce: Duration,
    /// Only report files with these names (empty = every file).
    pub file_names: HashSet<OsString>,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            debounce: Duration::from_millis(500),
            file_names: HashSet::new(),
        }
    }
}

/// Builder for [`FileWatcher`].
#[derive(Debug, Default)]
pub struct FileWatcherBuilder {
    config: FileWatcherConfig,
}

impl FileWatcherBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window. Default is 500ms.
    #[must_use]
    pub fn with_debounce(mut self, duration: Duration) -> Self {
        self.config.debounce = duration;
        self
    }

    /// Watch a file or directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist.
    pub fn watch_path<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("path does not exist: {}", path.display()),
            )));
        }
        self.config.paths.push(path.to_path_buf());
        Ok(self)
    }

    /// Watch a single file through its parent directory, so that
    /// replace-by-rename saves are seen.
    ///
    /// # Errors
    ///
    /// Returns an error if the file has no existing parent directory or no
    /// file name.
    pub fn watch_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(ConfigError::InvalidConfig {
                message: format!("cannot watch {}: not a file path", path.display()),
            });
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let name = name.to_os_string();

        let mut builder = self.watch_path(parent)?;
        builder.config.file_names.insert(name);
        Ok(builder)
    }

    /// Only report files with one of these names.
    #[must_use]
    pub fn watch_file_names(mut self, names: &[&str]) -> Self {
        self.config
            .file_names
            .extend(names.iter().map(OsString::from));
        self
    }

    /// Start watching.
    ///
    /// # Errors
    ///
    /// Returns an error if no paths are configured or the platform watcher
    /// cannot be created.
    pub fn build(self) -> Result<FileWatcher, ConfigError> {
        if self.config.paths.is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "no paths configured for file watcher".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                // The receiver may be gone during shutdown.
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(error) => tracing::warn!(%error, "file watcher error"),
            }
        })
        .map_err(|e| ConfigError::InvalidConfig {
            message: format!("failed to create file watcher: {e}"),
        })?;

        for path in &self.config.paths {
            watcher.watch(path, RecursiveMode::NonRecursive).map_err(|e| {
                ConfigError::Io(std::io::Error::other(format!(
                    "failed to watch path {}: {e}",
                    path.display()
                )))
            })?;
            tracing::debug!(path = %path.display(), "watching for config changes");
        }

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            config: self.config,
            last_event: None,
        })
    }
}

/// Debounced filesystem watcher for config files.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    config: FileWatcherConfig,
    last_event: Option<(PathBuf, Instant)>,
}

impl FileWatcher {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> FileWatcherBuilder {
        FileWatcherBuilder::new()
    }

    /// Settings in use.
    pub fn config(&self) -> &FileWatcherConfig {
        &self.config
    }

    /// Wait for the next change. Returns `None` once the watcher shuts down.
    pub async fn next(&mut self) -> Option<FileChangeEvent> {
        while let Some(event) = self.rx.recv().await {
            if let Some(change) = self.process_event(event) {
                return Some(change);
            }
        }
        None
    }

    fn process_event(&mut self, event: Event) -> Option<FileChangeEvent> {
        let kind = FileChangeKind::from_event(&event.kind)?;
        let path = event
            .paths
            .into_iter()
            .find(|path| self.matches(path))?;

        let now = Instant::now();
        if let Some((last_path, last_time)) = &self.last_event {
            if *last_path == path && now.duration_since(*last_time) < self.config.debounce {
                return None;
            }
        }
        self.last_event = Some((path.clone(), now));

        Some(FileChangeEvent {
            path,
            kind,
            timestamp: now,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        self.config.file_names.is_empty()
            || path
                .file_name()
                .is_some_and(|name| self.config.file_names.contains(name))
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
