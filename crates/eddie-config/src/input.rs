//! Untrusted, partial configuration layers.
//!
//! [`RawConfigInput`] is what a config file or an editor hands us: every key
//! optional, every leaf decoded leniently so that any structurally valid
//! JSON/YAML mapping parses. [`CliOverrides`] is the flat bag produced by the
//! command-line / environment surface.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{
    AgentDefinition, ContextResource, LogDestination, LogLevel, PersistenceConfig,
    ProviderOverride, ProviderProfile, ToolSource,
};

/// Decode an optional value, dropping it instead of failing when its shape
/// is wrong.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(error) => {
            tracing::debug!(%error, "ignoring malformed config value");
            Ok(None)
        }
    }
}

/// Like [`lenient`] for fields that are not optional: a malformed value
/// becomes `T::default()`, which the validator then reports at its path.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    lenient(deserializer).map(Option::unwrap_or_default)
}

/// Decode a list entry by entry. A malformed entry keeps its slot as
/// `T::default()` so later issues still point at the right index; a value
/// that is not a list at all is dropped.
pub(crate) fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Array(items) => items,
        other => {
            tracing::debug!(found = %other, "ignoring config value that is not a list");
            return Ok(None);
        }
    };

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).unwrap_or_else(|error| {
                tracing::debug!(index, %error, "ignoring malformed list entry");
                T::default()
            })
        })
        .collect();
    Ok(Some(entries))
}

/// Partial configuration as read from a file. Mirrors
/// [`ResolvedConfig`](crate::ResolvedConfig) with every field optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawConfigInput {
    /// Schema version; absent means 0.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Model identifier.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider descriptor fields.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub provider: Option<RawProviderConfig>,

    /// Provider profiles; entries replace defaults key by key.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub providers: Option<IndexMap<String, ProviderProfile>>,

    /// Project directory.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,

    /// Base system prompt.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Bare log level alias; `logging.level` wins when both are set.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,

    /// Context section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub context: Option<RawContextConfig>,

    /// Logging section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub logging: Option<RawLoggingConfig>,

    /// Output section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub output: Option<RawOutputConfig>,

    /// Tools section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tools: Option<RawToolsConfig>,

    /// Hooks section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hooks: Option<RawHooksConfig>,

    /// Tokenizer section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<RawTokenizerConfig>,

    /// Agents section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub agents: Option<RawAgentsConfig>,

    /// API section.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub api: Option<RawApiConfig>,

    /// Keys this schema version does not know; migrations consume legacy
    /// ones, the rest round-trip untouched.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl RawConfigInput {
    /// Declared schema version, 0 when absent.
    pub fn declared_version(&self) -> u32 {
        self.version.unwrap_or(0)
    }
}

/// Partial provider descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawProviderConfig {
    /// Provider name.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API key.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API version.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Partial context section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawContextConfig {
    /// Include globs.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Exclude globs.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Base directory.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,
    /// Byte budget.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
    /// File budget.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_files: Option<u64>,
    /// Resources; replaces the lower layer's list wholesale.
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ContextResource>>,
}

/// Partial logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawLoggingConfig {
    /// Level.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    /// Destination.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub destination: Option<LogDestination>,
    /// Timestamps.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_timestamps: Option<bool>,
}

/// Partial output section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawOutputConfig {
    /// JSONL trace path.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub jsonl_trace: Option<String>,
    /// Append to trace.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub jsonl_append: Option<bool>,
    /// Pretty stream.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pretty_stream: Option<bool>,
}

/// Partial tools section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawToolsConfig {
    /// Enabled tools.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,
    /// Disabled tools.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
    /// Auto-approve.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    /// Sources; replaces the lower layer's list wholesale.
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<ToolSource>>,
}

/// Partial hooks section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawHooksConfig {
    /// Modules.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
    /// Directory.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Partial tokenizer section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenizerConfig {
    /// Provider.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Partial agents section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawAgentsConfig {
    /// Mode.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Manager fields.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub manager: Option<RawAgentManagerConfig>,
    /// Subagents; replaces the lower layer's list wholesale.
    #[serde(default, deserialize_with = "lenient_seq", skip_serializing_if = "Option::is_none")]
    pub subagents: Option<Vec<AgentDefinition>>,
    /// Routing thresholds.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub routing: Option<RawAgentRoutingConfig>,
    /// Subagent enable flag.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub enable_subagents: Option<bool>,
}

/// Partial manager agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawAgentManagerConfig {
    /// Prompt.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Model.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider reference.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderOverride>,
}

/// Partial routing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawAgentRoutingConfig {
    /// Confidence threshold.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    /// Maximum depth.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,
}

/// Partial API section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawApiConfig {
    /// Host.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Port.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Persistence; replaces the lower layer's block wholesale.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceConfig>,
}

/// Overrides from the command line and environment.
///
/// Every field is independently optional; a present field always wins over
/// the file and default layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliOverrides {
    /// Explicit config file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    /// Context include globs; replaces `context.include` when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider profile name, bare provider name, or inline descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderOverride>,
    /// JSONL trace path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonl_trace: Option<String>,
    /// Log level for both `logLevel` and `logging.level`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    /// Log file; switches the destination to a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Agent orchestration mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_mode: Option<String>,
    /// Enabled tools; replaces `tools.enabled` when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    /// Disabled tools; replaces `tools.disabled` when non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_tools: Option<Vec<String>>,
    /// Tool auto-approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    /// Runtime flag; not part of the resolved configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_interactive: Option<bool>,
    /// Turn subagent delegation off (or back on with `Some(false)`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_subagents: Option<bool>,
    /// Clear context gathering entirely; beats `context`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_context: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_types_are_dropped_not_fatal() {
        let input: RawConfigInput = serde_json::from_str(
            r#"{
                "model": 42,
                "logLevel": "loud",
                "context": { "include": "not-a-list", "maxFiles": 3 },
                "tools": "everything"
            }"#,
        )
        .unwrap();

        assert!(input.model.is_none());
        assert!(input.log_level.is_none());
        let context = input.context.unwrap();
        assert!(context.include.is_none());
        assert_eq!(context.max_files, Some(3));
        assert!(input.tools.is_none());
    }

    #[test]
    fn test_malformed_entry_keeps_its_slot() {
        let input: RawConfigInput = serde_json::from_str(
            r#"{
                "agents": { "subagents": [{ "id": "good" }, { "id": 7 }, "junk"] },
                "tools": { "sources": [
                    { "id": "docs", "url": "http://localhost:7000/mcp" },
                    { "id": "bad", "url": 42 }
                ] }
            }"#,
        )
        .unwrap();

        let subagents = input.agents.unwrap().subagents.unwrap();
        assert_eq!(subagents.len(), 3);
        assert_eq!(subagents[0].id, "good");
        assert_eq!(subagents[1].id, "");
        assert_eq!(subagents[2], AgentDefinition::default());

        let sources = input.tools.unwrap().sources.unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].id, "bad");
        assert_eq!(sources[1].url, "");
        assert_eq!(sources[1].kind, "mcp");
    }

    #[test]
    fn test_malformed_connection_leaf_keeps_driver() {
        let input: RawConfigInput = serde_json::from_str(
            r#"{ "api": { "persistence": {
                "driver": "postgres",
                "connection": { "host": 5, "port": "x", "database": "eddie" }
            } } }"#,
        )
        .unwrap();

        let persistence = input.api.unwrap().persistence.unwrap();
        assert_eq!(persistence.driver, crate::PersistenceDriver::Postgres);
        let connection = persistence.connection.unwrap();
        assert!(connection.host.is_none());
        assert!(connection.port.is_none());
        assert_eq!(connection.database.as_deref(), Some("eddie"));
    }

    #[test]
    fn test_non_list_entries_field_is_dropped() {
        let input: RawConfigInput =
            serde_json::from_str(r#"{ "agents": { "subagents": "reviewer" } }"#).unwrap();
        assert!(input.agents.unwrap().subagents.is_none());
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let input: RawConfigInput =
            serde_json::from_str(r#"{"model":"m","tokenizerProvider":"anthropic"}"#).unwrap();
        assert_eq!(input.model.as_deref(), Some("m"));
        assert_eq!(
            input.extra.get("tokenizerProvider"),
            Some(&serde_json::json!("anthropic"))
        );

        let back = serde_json::to_value(&input).unwrap();
        assert_eq!(back["tokenizerProvider"], "anthropic");
    }

    #[test]
    fn test_declared_version_defaults_to_zero() {
        assert_eq!(RawConfigInput::default().declared_version(), 0);
        let input: RawConfigInput = serde_json::from_str(r#"{"version":2}"#).unwrap();
        assert_eq!(input.declared_version(), 2);
    }

    #[test]
    fn test_null_values_are_absent() {
        let input: RawConfigInput =
            serde_json::from_str(r#"{"model":null,"agents":{"mode":null}}"#).unwrap();
        assert!(input.model.is_none());
        assert!(input.agents.unwrap().mode.is_none());
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let json = serde_json::to_string(&RawConfigInput::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_cli_overrides_accept_inline_provider() {
        let overrides: CliOverrides =
            serde_json::from_str(r#"{"provider":{"name":"anthropic"},"autoApprove":true}"#)
                .unwrap();
        assert!(matches!(overrides.provider, Some(ProviderOverride::Inline(_))));
        assert_eq!(overrides.auto_approve, Some(true));
    }
}
