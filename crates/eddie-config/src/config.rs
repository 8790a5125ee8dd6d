//! Main configuration types.
//!
//! This module provides the top-level [`ResolvedConfig`] struct: the single
//! authoritative, fully populated configuration produced by
//! [`compose`](crate::compose) and accepted by [`validate`](crate::validate).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::schema::{
    AgentsConfig, ApiConfig, ContextConfig, HooksConfig, LogLevel, LoggingConfig, OutputConfig,
    ProviderConfig, ProviderOverride, ProviderProfile, TokenizerConfig, ToolsConfig,
};

/// Complete, resolved Eddie configuration.
///
/// Every section is always present; collections may be empty.
///
/// # Example
///
/// ```
/// use eddie_config::ResolvedConfig;
///
/// let config = ResolvedConfig::default();
/// assert_eq!(config.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// Schema version.
    #[serde(default)]
    pub version: u32,

    /// Model identifier.
    #[serde(default)]
    pub model: String,

    /// Active provider.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Named provider profiles.
    #[serde(default)]
    pub providers: IndexMap<String, ProviderProfile>,

    /// Project directory the agent operates in.
    #[serde(default)]
    pub project_dir: String,

    /// Base system prompt.
    #[serde(default)]
    pub system_prompt: String,

    /// Top-level alias of `logging.level`; always equal to it.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Context gathering.
    #[serde(default)]
    pub context: ContextConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Output / trace.
    #[serde(default)]
    pub output: OutputConfig,

    /// Tools.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Hook modules.
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Tokenizer.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Agent topology.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Control-plane API.
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        defaults::default_config()
    }
}

impl ResolvedConfig {
    /// Resolve a provider reference against `providers`.
    ///
    /// A name that matches a profile yields that profile's descriptor and
    /// model. Any other name is taken as a bare provider name and yields no
    /// model; unknown names are accepted so resolution can be deferred to
    /// dispatch time.
    pub fn resolve_provider(&self, reference: &ProviderOverride) -> (ProviderConfig, Option<String>) {
        match reference {
            ProviderOverride::ByName(name) => match self.providers.get(name) {
                Some(profile) => (profile.provider.clone(), profile.model.clone()),
                None => (ProviderConfig::named(name.clone()), None),
            },
            ProviderOverride::Inline(provider) => (provider.clone(), None),
        }
    }

    /// Effective provider and model for a subagent, falling back to the
    /// manager and then the top-level settings.
    pub fn subagent_provider(&self, id: &str) -> Option<(ProviderConfig, String)> {
        let agent = self.agents.subagents.iter().find(|agent| agent.id == id)?;
        let reference = agent
            .provider
            .as_ref()
            .or(self.agents.manager.provider.as_ref());

        let (provider, profile_model) = match reference {
            Some(reference) => self.resolve_provider(reference),
            None => (self.provider.clone(), None),
        };
        let model = agent
            .model
            .clone()
            .or(profile_model)
            .or_else(|| self.agents.manager.model.clone())
            .unwrap_or_else(|| self.model.clone());

        Some((provider, model))
    }
}
