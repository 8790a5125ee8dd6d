//! Flag and environment surface.
//!
//! Every override can be given as a flag or as an `EDDIE_*` environment
//! variable (flags win). [`OverrideArgs::to_overrides`] turns the parsed
//! values into [`CliOverrides`].

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use eddie_config::{CliOverrides, ConfigFormat, LogLevel, ProviderConfig, ProviderOverride};

/// Resolve, check and watch Eddie configuration.
#[derive(Debug, Parser)]
#[command(name = "eddie", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overrides.
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Command to run; `show` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Show { format: None })
    }
}

/// Commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the resolved configuration.
    Show {
        /// Output format; YAML by default, JSON when non-interactive.
        #[arg(long, value_parser = parse_format)]
        format: Option<ConfigFormat>,
    },
    /// Load and validate, reporting every problem found.
    Check,
    /// Upgrade the config file to the current schema version.
    Migrate {
        /// Write the upgraded file back instead of printing it.
        #[arg(long)]
        write: bool,
    },
    /// Reload the configuration whenever the file changes.
    Watch {
        /// Quiet period before a change is reported, in milliseconds.
        #[arg(long, default_value_t = 250)]
        debounce_ms: u64,
    },
}

impl Command {
    /// Debounce window for `watch`.
    pub fn debounce(&self) -> Option<Duration> {
        match self {
            Self::Watch { debounce_ms } => Some(Duration::from_millis(*debounce_ms)),
            _ => None,
        }
    }
}

/// Override flags. Each maps onto one [`CliOverrides`] field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct OverrideArgs {
    /// Config file to load instead of searching.
    #[arg(short, long, env = "EDDIE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Context include globs (comma-separated).
    #[arg(long, env = "EDDIE_CONTEXT", value_delimiter = ',', global = true)]
    pub context: Vec<String>,

    /// Model identifier.
    #[arg(short, long, env = "EDDIE_MODEL", global = true)]
    pub model: Option<String>,

    /// Provider profile, provider name, or an inline JSON descriptor.
    #[arg(long, env = "EDDIE_PROVIDER", value_parser = parse_provider, global = true)]
    pub provider: Option<ProviderOverride>,

    /// JSONL trace file.
    #[arg(long, env = "EDDIE_JSONL_TRACE", global = true)]
    pub jsonl_trace: Option<String>,

    /// Log level: silent, error, warn, info, debug or trace.
    #[arg(long, env = "EDDIE_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Write logs to this file.
    #[arg(long, env = "EDDIE_LOG_FILE", global = true)]
    pub log_file: Option<String>,

    /// Agent orchestration mode.
    #[arg(long, env = "EDDIE_AGENT_MODE", global = true)]
    pub agent_mode: Option<String>,

    /// Enabled tools (comma-separated).
    #[arg(long, env = "EDDIE_TOOLS", value_delimiter = ',', global = true)]
    pub tools: Vec<String>,

    /// Disabled tools (comma-separated).
    #[arg(long, env = "EDDIE_DISABLED_TOOLS", value_delimiter = ',', global = true)]
    pub disabled_tools: Vec<String>,

    /// Approve tool calls without asking.
    #[arg(
        long,
        env = "EDDIE_AUTO_APPROVE",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    pub auto_approve: Option<bool>,

    /// Machine-readable output.
    #[arg(
        long,
        env = "EDDIE_NON_INTERACTIVE",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    pub non_interactive: Option<bool>,

    /// Turn off subagent delegation.
    #[arg(
        long,
        env = "EDDIE_DISABLE_SUBAGENTS",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    pub disable_subagents: Option<bool>,

    /// Skip context gathering entirely.
    #[arg(
        long,
        env = "EDDIE_DISABLE_CONTEXT",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        global = true
    )]
    pub disable_context: Option<bool>,
}

impl OverrideArgs {
    /// Build the override layer.
    ///
    /// List values are trimmed and deduplicated in first-seen order. An
    /// unrecognised log level is dropped.
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            config: self.config.clone(),
            context: list(&self.context),
            model: non_empty(self.model.as_deref()),
            provider: self.provider.clone(),
            jsonl_trace: non_empty(self.jsonl_trace.as_deref()),
            log_level: self.log_level(),
            log_file: non_empty(self.log_file.as_deref()),
            agent_mode: non_empty(self.agent_mode.as_deref()),
            tools: list(&self.tools),
            disabled_tools: list(&self.disabled_tools),
            auto_approve: self.auto_approve,
            non_interactive: self.non_interactive,
            disable_subagents: self.disable_subagents,
            disable_context: self.disable_context,
        }
    }

    /// The requested log level, if it is one of [`LogLevel::ALL`].
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.as_deref()?.parse().ok()
    }

    /// Whether a log level was given but not recognised.
    pub fn ignored_log_level(&self) -> Option<&str> {
        match (&self.log_level, self.log_level()) {
            (Some(raw), None) => Some(raw.as_str()),
            _ => None,
        }
    }

    /// Whether output should be machine-readable.
    pub fn is_non_interactive(&self) -> bool {
        self.non_interactive.unwrap_or(false)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn list(values: &[String]) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !out.iter().any(|seen| seen == value) {
            out.push(value.to_string());
        }
    }
    (!out.is_empty()).then_some(out)
}

fn parse_provider(value: &str) -> Result<ProviderOverride, String> {
    let value = value.trim();
    if value.starts_with('{') {
        serde_json::from_str::<ProviderConfig>(value)
            .map(ProviderOverride::Inline)
            .map_err(|e| format!("invalid provider descriptor: {e}"))
    } else if value.is_empty() {
        Err("provider must not be empty".to_string())
    } else {
        Ok(ProviderOverride::ByName(value.to_string()))
    }
}

fn parse_format(value: &str) -> Result<ConfigFormat, String> {
    value.parse().map_err(|e: eddie_config::ConfigError| e.to_string())
}
