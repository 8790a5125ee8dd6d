//! Config source text codec.
//!
//! Converts between file text and [`RawConfigInput`]. The format is picked
//! from the file name: `.json` and `.rc` files are JSON, everything else
//! (including extensionless dotfiles such as `.eddierc`) is YAML.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::RawConfigInput;
use crate::ConfigError;

/// Serialization format of a config source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// YAML (default block style).
    #[default]
    Yaml,
    /// JSON (pretty-printed, two-space indent).
    Json,
}

impl ConfigFormat {
    /// Detect the format from a path's extension.
    ///
    /// # Example
    ///
    /// ```
    /// use eddie_config::ConfigFormat;
    ///
    /// assert_eq!(ConfigFormat::from_path("eddie.config.json"), ConfigFormat::Json);
    /// assert_eq!(ConfigFormat::from_path(".eddierc"), ConfigFormat::Yaml);
    /// assert_eq!(ConfigFormat::from_path("settings.rc"), ConfigFormat::Json);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("json" | "rc") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidConfig {
                message: format!("unsupported configuration format: {s}"),
            }),
        }
    }
}

/// Parse source text into a raw input.
///
/// Empty or whitespace-only text, and an explicit null document, parse to an
/// empty input.
///
/// # Errors
///
/// Returns [`ConfigError::MalformedSource`] if the text is not valid in
/// `format` or its top level is not a mapping.
///
/// # Example
///
/// ```
/// use eddie_config::{parse_source, ConfigFormat, RawConfigInput};
///
/// let input = parse_source("model: gpt-4o\n", ConfigFormat::Yaml).unwrap();
/// assert_eq!(input.model.as_deref(), Some("gpt-4o"));
///
/// assert_eq!(parse_source("  \n", ConfigFormat::Json).unwrap(), RawConfigInput::default());
/// ```
pub fn parse_source(content: &str, format: ConfigFormat) -> Result<RawConfigInput, ConfigError> {
    if content.trim().is_empty() {
        return Ok(RawConfigInput::default());
    }

    let value: Value = match format {
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::malformed(format, e))?
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| ConfigError::malformed(format, e))?
        }
    };

    match value {
        Value::Null => Ok(RawConfigInput::default()),
        Value::Object(_) => {
            serde_json::from_value(value).map_err(|e| ConfigError::malformed(format, e))
        }
        other => Err(ConfigError::malformed(
            format,
            format!("expected a mapping at the top level, found {}", kind_of(&other)),
        )),
    }
}

/// Serialize a raw input in `format`.
///
/// JSON is pretty-printed with a trailing newline; YAML uses the default
/// block style.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if the input holds a value the format
/// cannot represent.
pub fn serialize_input(input: &RawConfigInput, format: ConfigFormat) -> Result<String, ConfigError> {
    let serialize_error = |message: String| ConfigError::Serialize { format, message };

    match format {
        ConfigFormat::Json => serde_json::to_string_pretty(input)
            .map(|mut text| {
                text.push('\n');
                text
            })
            .map_err(|e| serialize_error(e.to_string())),
        ConfigFormat::Yaml => {
            serde_yaml::to_string(input).map_err(|e| serialize_error(e.to_string()))
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
