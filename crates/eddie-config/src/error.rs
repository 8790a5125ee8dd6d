//! Configuration error types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::source::ConfigFormat;

/// Errors that can occur while loading, composing or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("config file not found at {}", path.display())]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {}", path.display())]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a configuration file.
    #[error("failed to write configuration file: {}", path.display())]
    WriteError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file declares a schema version newer than this build understands.
    #[error("unsupported config version {found}; this build supports up to version {supported}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Newest version this build can read.
        supported: u32,
    },

    /// The migration chain has a gap at `from`.
    #[error("no migration registered from config version {from}")]
    NoMigrationPath {
        /// Version with no registered step.
        from: u32,
    },

    /// A write destination is absolute or escapes the config root.
    #[error("invalid config write target {}: {reason}", target.display())]
    InvalidPathTarget {
        /// The rejected target.
        target: PathBuf,
        /// Why the target was rejected.
        reason: String,
    },

    /// Source text could not be parsed as a mapping in its declared format.
    #[error("malformed {format} configuration: {message}")]
    MalformedSource {
        /// Declared format of the source.
        format: ConfigFormat,
        /// Parser message.
        message: String,
    },

    /// Failed to serialize configuration input.
    #[error("failed to serialize {format} configuration: {message}")]
    Serialize {
        /// Target format.
        format: ConfigFormat,
        /// Serializer message.
        message: String,
    },

    /// One or more structural validation issues.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationErrors),

    /// Invalid configuration for a component.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new write error.
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid write target error.
    pub fn invalid_path_target(target: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPathTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a new malformed source error.
    pub fn malformed(format: ConfigFormat, message: impl fmt::Display) -> Self {
        Self::MalformedSource {
            format,
            message: message.to_string(),
        }
    }

    /// Issues carried by a validation failure, if this is one.
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::ValidationFailed(errors) => Some(errors.issues()),
            _ => None,
        }
    }
}

/// A single structural problem found by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted/bracketed location, e.g. `agents.subagents[2].id`.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Create a new issue.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Aggregate of every issue found in one validation pass, in rule order.
///
/// Never empty: the validator only constructs one when at least one rule
/// failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub(crate) fn new(issues: Vec<ValidationIssue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    /// Every issue, in the order the rules ran.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of failed checks.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consume into the issue list.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [issue] = self.issues.as_slice() {
            return write!(f, "configuration validation failed: {issue}");
        }
        write!(
            f,
            "configuration validation failed: {} checks failed",
            self.issues.len()
        )?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
