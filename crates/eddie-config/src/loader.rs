//! Config file discovery and the read/write boundary.
//!
//! Discovery walks [`CONFIG_FILENAMES`] in each search root, config root
//! first, then the working directory. Writes to a named target are confined
//! to the config root.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::source::ConfigFormat;
use crate::ConfigError;

/// Candidate file names, in search order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "eddie.config.json",
    "eddie.config.yaml",
    "eddie.config.yml",
    ".eddierc",
    ".eddierc.json",
    ".eddierc.yaml",
];

/// Environment variable overriding the config root.
pub const CONFIG_DIR_ENV: &str = "EDDIE_CONFIG_DIR";

/// Directories the loader searches and writes relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Root that relative write targets are confined to; searched first.
    pub config_root: PathBuf,
    /// Process working directory; searched second.
    pub cwd: PathBuf,
}

impl ConfigPaths {
    /// Explicit roots. A relative `config_root` is taken relative to `cwd`.
    pub fn new(config_root: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let config_root = config_root.into();
        let config_root = if config_root.is_absolute() {
            config_root
        } else {
            cwd.join(config_root)
        };
        Self { config_root, cwd }
    }

    /// Roots derived from the process: `$EDDIE_CONFIG_DIR` (or the working
    /// directory when unset) and the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the working directory cannot be read.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = env::current_dir()?;
        let config_root = env::var_os(CONFIG_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.clone());
        Ok(Self::new(config_root, cwd))
    }

    /// Search roots in order, without duplicates.
    pub fn search_roots(&self) -> Vec<&Path> {
        let mut roots = vec![self.config_root.as_path()];
        if self.cwd != self.config_root {
            roots.push(self.cwd.as_path());
        }
        roots
    }

    /// Where a new config file is created when nothing was found.
    pub fn default_target(&self, format: ConfigFormat) -> PathBuf {
        let name = match format {
            ConfigFormat::Json => "eddie.config.json",
            ConfigFormat::Yaml => "eddie.config.yaml",
        };
        self.config_root.join(name)
    }
}

/// Locate the config file to load.
///
/// An explicit path (relative paths resolve against `cwd`) must exist.
/// Without one, the first existing candidate wins; `Ok(None)` means no file
/// exists and defaults apply.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if `explicit` does not exist.
pub async fn resolve_config_path(
    explicit: Option<&Path>,
    paths: &ConfigPaths,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(explicit) = explicit {
        let path = paths.cwd.join(explicit);
        if !is_file(&path).await {
            return Err(ConfigError::file_not_found(explicit));
        }
        return Ok(Some(path));
    }

    for root in paths.search_roots() {
        for name in CONFIG_FILENAMES {
            let candidate = root.join(name);
            if is_file(&candidate).await {
                tracing::debug!(path = %candidate.display(), "found config file");
                return Ok(Some(candidate));
            }
        }
    }

    Ok(None)
}

// Probe failures (permissions, broken links) count as absent.
async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Resolve a named write target inside the config root.
///
/// The target must be relative and must not climb out of the root through
/// `..` segments. Nothing touches the filesystem.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPathTarget`] for absolute or escaping
/// targets.
///
/// # Example
///
/// ```
/// use eddie_config::{resolve_write_target, ConfigPaths};
///
/// let paths = ConfigPaths::new("/srv/eddie", "/srv/eddie");
/// let target = resolve_write_target("profiles/../eddie.config.yaml".as_ref(), &paths).unwrap();
/// assert_eq!(target, std::path::Path::new("/srv/eddie/eddie.config.yaml"));
///
/// assert!(resolve_write_target("../elsewhere.yaml".as_ref(), &paths).is_err());
/// ```
pub fn resolve_write_target(target: &Path, paths: &ConfigPaths) -> Result<PathBuf, ConfigError> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in target.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(ConfigError::invalid_path_target(
                        target,
                        "target escapes the config root",
                    ));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::invalid_path_target(
                    target,
                    "absolute targets are not allowed",
                ));
            }
        }
    }

    if parts.is_empty() {
        return Err(ConfigError::invalid_path_target(
            target,
            "target does not name a file",
        ));
    }

    Ok(parts
        .into_iter()
        .fold(paths.config_root.clone(), |path, part| path.join(part)))
}

/// Read a config file as text.
///
/// # Errors
///
/// Returns [`ConfigError::FileNotFound`] if the file vanished and
/// [`ConfigError::ReadError`] for any other I/O failure.
pub async fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::file_not_found(path)
        } else {
            ConfigError::read_error(path, e)
        }
    })
}

/// Write config text, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::WriteError`] on any I/O failure.
pub async fn write_config_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::write_error(path, e))?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ConfigError::write_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths_in(root: &TempDir, cwd: &TempDir) -> ConfigPaths {
        ConfigPaths::new(root.path(), cwd.path())
    }

    #[tokio::test]
    async fn test_no_file_means_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::new(dir.path(), dir.path());
        assert_eq!(resolve_config_path(None, &paths).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::new(dir.path(), dir.path());
        let err = resolve_config_path(Some(Path::new("missing.yaml")), &paths)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "config file not found at missing.yaml");
    }

    #[tokio::test]
    async fn test_explicit_relative_path_resolves_against_cwd() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("custom.yaml"), "model: m\n").unwrap();
        let paths = ConfigPaths::new(dir.path(), dir.path());

        let found = resolve_config_path(Some(Path::new("custom.yaml")), &paths)
            .await
            .unwrap();
        assert_eq!(found, Some(dir.path().join("custom.yaml")));
    }

    #[tokio::test]
    async fn test_candidate_order_within_a_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".eddierc"), "").unwrap();
        fs::write(dir.path().join("eddie.config.yml"), "").unwrap();
        let paths = ConfigPaths::new(dir.path(), dir.path());

        let found = resolve_config_path(None, &paths).await.unwrap();
        assert_eq!(found, Some(dir.path().join("eddie.config.yml")));
    }

    #[tokio::test]
    async fn test_config_root_searched_before_cwd() {
        let root = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        fs::write(cwd.path().join("eddie.config.json"), "{}").unwrap();
        fs::write(root.path().join(".eddierc.yaml"), "").unwrap();

        let found = resolve_config_path(None, &paths_in(&root, &cwd)).await.unwrap();
        assert_eq!(found, Some(root.path().join(".eddierc.yaml")));
    }

    #[tokio::test]
    async fn test_directories_are_not_config_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("eddie.config.json")).unwrap();
        let paths = ConfigPaths::new(dir.path(), dir.path());
        assert_eq!(resolve_config_path(None, &paths).await.unwrap(), None);
    }

    #[test]
    fn test_search_roots_are_deduplicated() {
        let paths = ConfigPaths::new("/a", "/a");
        assert_eq!(paths.search_roots(), vec![Path::new("/a")]);
        let paths = ConfigPaths::new("conf", "/work");
        assert_eq!(
            paths.search_roots(),
            vec![Path::new("/work/conf"), Path::new("/work")]
        );
    }

    #[test]
    fn test_write_target_containment() {
        let paths = ConfigPaths::new("/srv/eddie", "/srv");

        assert_eq!(
            resolve_write_target(Path::new("eddie.config.json"), &paths).unwrap(),
            PathBuf::from("/srv/eddie/eddie.config.json")
        );
        assert_eq!(
            resolve_write_target(Path::new("./nested/./.eddierc"), &paths).unwrap(),
            PathBuf::from("/srv/eddie/nested/.eddierc")
        );

        for rejected in ["/etc/eddie.yaml", "../eddie.yaml", "a/../../eddie.yaml", ".", ""] {
            let err = resolve_write_target(Path::new(rejected), &paths).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidPathTarget { .. }),
                "{rejected} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/eddie.config.yaml");

        write_config_file(&path, "model: m\n").await.unwrap();
        assert_eq!(read_config_file(&path).await.unwrap(), "model: m\n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_config_file(&dir.path().join("gone.yaml")).await.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
