//! Built-in baseline configuration.
//!
//! Everything here is a constant or a pure constructor; the baseline is the
//! lowest-precedence layer handed to [`compose`](crate::compose).

use indexmap::IndexMap;

use crate::schema::{
    AgentManagerConfig, AgentsConfig, ApiConfig, ContextConfig, HooksConfig, LogLevel,
    LoggingConfig, OutputConfig, ProviderConfig, TokenizerConfig, ToolsConfig,
};
use crate::ResolvedConfig;

/// Schema version written by this build.
pub const CURRENT_CONFIG_VERSION: u32 = 2;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default project directory (the process working directory).
pub const DEFAULT_PROJECT_DIR: &str = ".";

/// Default system prompt, also the manager prompt fallback.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Eddie, a pragmatic coding agent. Work in small, verifiable steps and explain what you changed.";

/// Default include glob for context gathering.
pub const DEFAULT_CONTEXT_INCLUDE: &str = "src/**/*";

/// Default context byte budget.
pub const DEFAULT_CONTEXT_MAX_BYTES: u64 = 250_000;

/// Default context file budget.
pub const DEFAULT_CONTEXT_MAX_FILES: u64 = 64;

/// Default JSONL trace location.
pub const DEFAULT_TRACE_PATH: &str = ".eddie/trace.jsonl";

/// Default tokenizer provider.
pub const DEFAULT_TOKENIZER_PROVIDER: &str = "openai";

/// Default agent orchestration mode.
pub const DEFAULT_AGENT_MODE: &str = "single";

/// Default API bind host.
pub const DEFAULT_API_HOST: &str = "0.0.0.0";

/// Default API bind port.
pub const DEFAULT_API_PORT: u16 = 4000;

/// The baseline configuration rooted at [`DEFAULT_PROJECT_DIR`].
pub fn default_config() -> ResolvedConfig {
    default_config_for(DEFAULT_PROJECT_DIR)
}

/// The baseline configuration for a specific project directory.
///
/// `context.baseDir` follows the project directory.
pub fn default_config_for(project_dir: impl Into<String>) -> ResolvedConfig {
    let project_dir = project_dir.into();
    let system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();

    ResolvedConfig {
        version: CURRENT_CONFIG_VERSION,
        model: DEFAULT_MODEL.to_string(),
        provider: ProviderConfig::named(DEFAULT_PROVIDER),
        providers: IndexMap::new(),
        context: ContextConfig {
            base_dir: project_dir.clone(),
            ..ContextConfig::default()
        },
        project_dir,
        log_level: LogLevel::Info,
        logging: LoggingConfig::default(),
        output: OutputConfig::default(),
        tools: ToolsConfig::default(),
        hooks: HooksConfig::default(),
        tokenizer: TokenizerConfig::default(),
        agents: AgentsConfig {
            manager: AgentManagerConfig {
                prompt: system_prompt.clone(),
                ..AgentManagerConfig::default()
            },
            ..AgentsConfig::default()
        },
        system_prompt,
        api: ApiConfig::default(),
    }
}
