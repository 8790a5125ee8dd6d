//! Configuration schema types.
//!
//! This module defines the structure of every section of a
//! [`ResolvedConfig`](crate::ResolvedConfig). Section defaults live next to
//! the types; the top-level baseline is assembled in [`crate::defaults`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defaults;

/// Log verbosity shared by `logLevel` and `logging.level`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No log output at all.
    Silent,
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages (default).
    #[default]
    Info,
    /// Debug output.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Every accepted level, least to most verbose.
    pub const ALL: [Self; 6] = [
        Self::Silent,
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    /// Lowercase name as written in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of [`LogLevel::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogLevel(pub String);

impl fmt::Display for UnknownLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: {}", self.0)
    }
}

impl std::error::Error for UnknownLogLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLogLevel(s.to_string()))
    }
}

/// Connection descriptor for a model provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider name (e.g. `openai`, `anthropic`).
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub name: String,

    /// Override for the provider's base URL.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_url: Option<String>,

    /// API key; usually supplied via environment instead.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,

    /// Provider API version.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
}

impl ProviderConfig {
    /// A descriptor carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A named, reusable provider + model pairing stored under `providers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    /// Provider descriptor.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub provider: ProviderConfig,

    /// Model to use with this provider.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,
}

/// A provider reference that is either a profile/provider name or an inline
/// descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProviderOverride {
    /// Name of a profile in `providers`, or a bare provider name.
    ByName(String),
    /// Full inline descriptor.
    Inline(ProviderConfig),
}

/// Context gathering rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextConfig {
    /// Glob patterns to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Directory globs are resolved against.
    #[serde(default)]
    pub base_dir: String,

    /// Upper bound on the total bytes of gathered context.
    #[serde(default)]
    pub max_bytes: u64,

    /// Upper bound on the number of gathered files.
    #[serde(default)]
    pub max_files: u64,

    /// Named context resources.
    #[serde(default)]
    pub resources: Vec<ContextResource>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            include: vec![defaults::DEFAULT_CONTEXT_INCLUDE.to_string()],
            exclude: Vec::new(),
            base_dir: defaults::DEFAULT_PROJECT_DIR.to_string(),
            max_bytes: defaults::DEFAULT_CONTEXT_MAX_BYTES,
            max_files: defaults::DEFAULT_CONTEXT_MAX_FILES,
            resources: Vec::new(),
        }
    }
}

/// A named context resource: a glob bundle or a rendered template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContextResource {
    /// Unique identifier.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub id: String,

    /// Resource kind: `bundle` or `template`.
    #[serde(
        rename = "type",
        default = "default_resource_kind",
        deserialize_with = "crate::input::lenient_or_default"
    )]
    pub kind: String,

    /// Display name.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Free-form description.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// Include globs (bundles).
    #[serde(
        default,
        deserialize_with = "crate::input::lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub include: Vec<String>,

    /// Exclude globs (bundles).
    #[serde(
        default,
        deserialize_with = "crate::input::lenient_or_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exclude: Vec<String>,

    /// Base directory for this resource's globs.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_dir: Option<String>,

    /// Template path (templates).
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub template: Option<String>,

    /// Template variables.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient_or_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub variables: IndexMap<String, serde_json::Value>,
}

fn default_resource_kind() -> String {
    "bundle".to_string()
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogDestinationKind {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// A file on disk; requires `path`.
    File,
}

/// Log destination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogDestination {
    /// Destination kind.
    #[serde(rename = "type", default)]
    pub kind: LogDestinationKind,

    /// File path when `kind` is `file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Human-readable rather than JSON lines.
    #[serde(default)]
    pub pretty: bool,
}

impl LogDestination {
    /// A file destination writing JSON lines to `path`.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            kind: LogDestinationKind::File,
            path: Some(path.into()),
            pretty: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Destination; stdout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<LogDestination>,

    /// Prefix records with timestamps.
    #[serde(default = "default_true")]
    pub enable_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            destination: Some(LogDestination {
                kind: LogDestinationKind::Stdout,
                path: None,
                pretty: true,
            }),
            enable_timestamps: true,
        }
    }
}

/// Agent output / trace settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// JSONL trace file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonl_trace: Option<String>,

    /// Append to an existing trace instead of truncating.
    #[serde(default = "default_true")]
    pub jsonl_append: bool,

    /// Pretty-print streamed output.
    #[serde(default = "default_true")]
    pub pretty_stream: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jsonl_trace: Some(defaults::DEFAULT_TRACE_PATH.to_string()),
            jsonl_append: true,
            pretty_stream: true,
        }
    }
}

/// Tool enablement and external tool sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    /// Tools explicitly enabled (empty means all built-ins).
    #[serde(default)]
    pub enabled: Vec<String>,

    /// Tools explicitly disabled.
    #[serde(default)]
    pub disabled: Vec<String>,

    /// Skip approval prompts for tool calls.
    #[serde(default)]
    pub auto_approve: bool,

    /// External tool sources.
    #[serde(default)]
    pub sources: Vec<ToolSource>,
}

/// An external tool source (an MCP server).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolSource {
    /// Unique identifier.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub id: String,

    /// Source kind; only `mcp` is recognised.
    #[serde(
        rename = "type",
        default = "default_tool_source_kind",
        deserialize_with = "crate::input::lenient_or_default"
    )]
    pub kind: String,

    /// Endpoint URL.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub url: String,

    /// Display name.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// Extra request headers.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient_or_default",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub headers: IndexMap<String, String>,

    /// Authentication.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth: Option<ToolSourceAuth>,
}

fn default_tool_source_kind() -> String {
    "mcp".to_string()
}

/// Tool source authentication. The fields required depend on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolSourceAuth {
    /// `none`, `basic` or `bearer`.
    #[serde(rename = "type", default, deserialize_with = "crate::input::lenient_or_default")]
    pub kind: String,

    /// Basic auth user.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,

    /// Bearer token.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<String>,
}

/// Hook module configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HooksConfig {
    /// Hook modules to load, in order.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Directory hook modules are resolved from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Tokenizer selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenizerConfig {
    /// Tokenizer provider name.
    #[serde(default = "default_tokenizer_provider")]
    pub provider: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            provider: default_tokenizer_provider(),
        }
    }
}

fn default_tokenizer_provider() -> String {
    defaults::DEFAULT_TOKENIZER_PROVIDER.to_string()
}

/// Agent topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentsConfig {
    /// Orchestration mode (e.g. `single`, `router`).
    #[serde(default)]
    pub mode: String,

    /// Manager agent.
    #[serde(default)]
    pub manager: AgentManagerConfig,

    /// Subagent definitions.
    #[serde(default)]
    pub subagents: Vec<AgentDefinition>,

    /// Routing thresholds.
    #[serde(default)]
    pub routing: AgentRoutingConfig,

    /// Allow the manager to delegate to subagents.
    #[serde(default = "default_true")]
    pub enable_subagents: bool,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            mode: defaults::DEFAULT_AGENT_MODE.to_string(),
            manager: AgentManagerConfig::default(),
            subagents: Vec::new(),
            routing: AgentRoutingConfig::default(),
            enable_subagents: true,
        }
    }
}

/// The manager agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentManagerConfig {
    /// System prompt; falls back to the top-level `systemPrompt`.
    #[serde(default)]
    pub prompt: String,

    /// Model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderOverride>,
}

/// A subagent definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    /// Unique identifier.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub id: String,

    /// Display name.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,

    /// What the subagent is for; used by routing.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// System prompt.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt: Option<String>,

    /// Model override.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,

    /// Provider override.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider: Option<ProviderOverride>,

    /// Tool allow-list for this subagent.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub tools: Option<Vec<String>>,

    /// Minimum routing confidence for this subagent.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub routing_threshold: Option<f64>,
}

/// Routing thresholds for delegation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentRoutingConfig {
    /// Minimum confidence to delegate, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,

    /// Maximum delegation depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,
}

/// Control-plane API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Bind host.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Persistence backend.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            persistence: PersistenceConfig::default(),
        }
    }
}

fn default_api_host() -> String {
    defaults::DEFAULT_API_HOST.to_string()
}

fn default_api_port() -> u16 {
    defaults::DEFAULT_API_PORT
}

/// Persistence driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceDriver {
    /// In-process memory.
    #[default]
    Memory,
    /// Local SQLite file.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    Mysql,
    /// MariaDB.
    Mariadb,
}

impl PersistenceDriver {
    /// Whether this driver needs a network connection block.
    pub fn is_sql_server(self) -> bool {
        matches!(self, Self::Postgres | Self::Mysql | Self::Mariadb)
    }

    /// Lowercase name as written in config files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceConfig {
    /// Driver.
    #[serde(default, deserialize_with = "crate::input::lenient_or_default")]
    pub driver: PersistenceDriver,

    /// SQLite options.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub sqlite: Option<SqliteConfig>,

    /// Connection block for server-backed SQL drivers.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub connection: Option<SqlConnectionConfig>,
}

/// SQLite options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SqliteConfig {
    /// Database file.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub filename: Option<String>,
}

/// Connection block for postgres/mysql/mariadb. Fields are optional here so
/// the validator can report every missing one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SqlConnectionConfig {
    /// Server host.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub host: Option<String>,

    /// Server port.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<u16>,

    /// Database name.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub database: Option<String>,

    /// User.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<String>,

    /// Password.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<String>,

    /// Use TLS.
    #[serde(
        default,
        deserialize_with = "crate::input::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssl: Option<bool>,
}

fn default_true() -> bool {
    true
}
