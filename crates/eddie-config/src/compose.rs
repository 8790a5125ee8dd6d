//! Layered composition: defaults < file input < CLI overrides.
//!
//! [`compose`] is a pure function of its three inputs. The file layer is
//! shallow-merged section by section over the defaults; nested collections
//! (`context.resources`, `tools.sources`, `agents.subagents`) are replaced
//! wholesale. After each layer the result is normalised: `logLevel` and
//! `logging.level` are reconciled and the manager prompt is filled in.

use crate::input::{
    CliOverrides, RawAgentsConfig, RawApiConfig, RawConfigInput, RawContextConfig,
    RawHooksConfig, RawLoggingConfig, RawOutputConfig, RawProviderConfig, RawToolsConfig,
};
use crate::schema::{LogDestination, LogLevel, ProviderOverride};
use crate::ResolvedConfig;

/// Compose one resolved configuration from the three layers.
///
/// # Example
///
/// ```
/// use eddie_config::{compose, CliOverrides, RawConfigInput, ResolvedConfig};
///
/// let file = RawConfigInput {
///     model: Some("file-model".to_string()),
///     ..Default::default()
/// };
/// let cli = CliOverrides {
///     model: Some("cli-model".to_string()),
///     ..Default::default()
/// };
///
/// let config = compose(&ResolvedConfig::default(), &file, &cli);
/// assert_eq!(config.model, "cli-model");
/// ```
pub fn compose(
    defaults: &ResolvedConfig,
    file: &RawConfigInput,
    cli: &CliOverrides,
) -> ResolvedConfig {
    let mut config = defaults.clone();

    merge_file_layer(&mut config, file);
    normalize(
        &mut config,
        file.logging.as_ref().and_then(|logging| logging.level),
        file.log_level,
    );

    merge_cli_layer(&mut config, cli);
    normalize(&mut config, None, cli.log_level);

    config
}

/// Reconcile the aliased log level fields and fill in the manager prompt.
///
/// `nested` is the layer's `logging.level`, `bare` its `logLevel`; the nested
/// value wins when both are present.
fn normalize(config: &mut ResolvedConfig, nested: Option<LogLevel>, bare: Option<LogLevel>) {
    let level = nested.or(bare).unwrap_or(config.logging.level);
    config.logging.level = level;
    config.log_level = level;

    if config.agents.manager.prompt.trim().is_empty() {
        config.agents.manager.prompt = config.system_prompt.clone();
    }
}

fn set<T>(target: &mut T, value: Option<&T>)
where
    T: Clone,
{
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn set_opt<T>(target: &mut Option<T>, value: Option<&T>)
where
    T: Clone,
{
    if let Some(value) = value {
        *target = Some(value.clone());
    }
}

fn merge_file_layer(config: &mut ResolvedConfig, file: &RawConfigInput) {
    set(&mut config.model, file.model.as_ref());
    set(&mut config.project_dir, file.project_dir.as_ref());
    set(&mut config.system_prompt, file.system_prompt.as_ref());

    if let Some(provider) = &file.provider {
        merge_provider(config, provider);
    }
    if let Some(providers) = &file.providers {
        for (name, profile) in providers {
            config.providers.insert(name.clone(), profile.clone());
        }
    }
    if let Some(context) = &file.context {
        merge_context(config, context);
    }
    if let Some(logging) = &file.logging {
        merge_logging(config, logging);
    }
    if let Some(output) = &file.output {
        merge_output(config, output);
    }
    if let Some(tools) = &file.tools {
        merge_tools(config, tools);
    }
    if let Some(hooks) = &file.hooks {
        merge_hooks(config, hooks);
    }
    if let Some(tokenizer) = &file.tokenizer {
        set(&mut config.tokenizer.provider, tokenizer.provider.as_ref());
    }
    if let Some(agents) = &file.agents {
        merge_agents(config, agents);
    }
    if let Some(api) = &file.api {
        merge_api(config, api);
    }
}

fn merge_provider(config: &mut ResolvedConfig, provider: &RawProviderConfig) {
    let target = &mut config.provider;
    set(&mut target.name, provider.name.as_ref());
    set_opt(&mut target.base_url, provider.base_url.as_ref());
    set_opt(&mut target.api_key, provider.api_key.as_ref());
    set_opt(&mut target.version, provider.version.as_ref());
}

fn merge_context(config: &mut ResolvedConfig, context: &RawContextConfig) {
    let target = &mut config.context;
    set(&mut target.include, context.include.as_ref());
    set(&mut target.exclude, context.exclude.as_ref());
    set(&mut target.base_dir, context.base_dir.as_ref());
    set(&mut target.max_bytes, context.max_bytes.as_ref());
    set(&mut target.max_files, context.max_files.as_ref());
    set(&mut target.resources, context.resources.as_ref());
}

fn merge_logging(config: &mut ResolvedConfig, logging: &RawLoggingConfig) {
    let target = &mut config.logging;
    set(&mut target.level, logging.level.as_ref());
    set_opt(&mut target.destination, logging.destination.as_ref());
    set(&mut target.enable_timestamps, logging.enable_timestamps.as_ref());
}

fn merge_output(config: &mut ResolvedConfig, output: &RawOutputConfig) {
    let target = &mut config.output;
    set_opt(&mut target.jsonl_trace, output.jsonl_trace.as_ref());
    set(&mut target.jsonl_append, output.jsonl_append.as_ref());
    set(&mut target.pretty_stream, output.pretty_stream.as_ref());
}

fn merge_tools(config: &mut ResolvedConfig, tools: &RawToolsConfig) {
    let target = &mut config.tools;
    set(&mut target.enabled, tools.enabled.as_ref());
    set(&mut target.disabled, tools.disabled.as_ref());
    set(&mut target.auto_approve, tools.auto_approve.as_ref());
    set(&mut target.sources, tools.sources.as_ref());
}

fn merge_hooks(config: &mut ResolvedConfig, hooks: &RawHooksConfig) {
    set(&mut config.hooks.modules, hooks.modules.as_ref());
    set_opt(&mut config.hooks.directory, hooks.directory.as_ref());
}

fn merge_agents(config: &mut ResolvedConfig, agents: &RawAgentsConfig) {
    let target = &mut config.agents;
    set(&mut target.mode, agents.mode.as_ref());
    set(&mut target.enable_subagents, agents.enable_subagents.as_ref());
    set(&mut target.subagents, agents.subagents.as_ref());

    if let Some(manager) = &agents.manager {
        set(&mut target.manager.prompt, manager.prompt.as_ref());
        set_opt(&mut target.manager.model, manager.model.as_ref());
        set_opt(&mut target.manager.provider, manager.provider.as_ref());
    }
    if let Some(routing) = &agents.routing {
        set_opt(
            &mut target.routing.confidence_threshold,
            routing.confidence_threshold.as_ref(),
        );
        set_opt(&mut target.routing.max_depth, routing.max_depth.as_ref());
    }
}

fn merge_api(config: &mut ResolvedConfig, api: &RawApiConfig) {
    let target = &mut config.api;
    set(&mut target.host, api.host.as_ref());
    set(&mut target.port, api.port.as_ref());
    set(&mut target.persistence, api.persistence.as_ref());
}

fn merge_cli_layer(config: &mut ResolvedConfig, cli: &CliOverrides) {
    // Profile lookup first so an explicit model override still wins.
    if let Some(provider) = &cli.provider {
        apply_provider_override(config, provider);
    }
    set(&mut config.model, cli.model.as_ref());
    set_opt(&mut config.output.jsonl_trace, cli.jsonl_trace.as_ref());
    set(&mut config.agents.mode, cli.agent_mode.as_ref());

    if let Some(path) = &cli.log_file {
        config.logging.destination = Some(LogDestination::file(path.clone()));
    }

    if let Some(include) = non_empty(cli.context.as_ref()) {
        config.context.include = include.clone();
    }
    if cli.disable_context == Some(true) {
        let context = &mut config.context;
        context.include.clear();
        context.resources.clear();
        context.max_bytes = 0;
        context.max_files = 0;
    }

    if let Some(enabled) = non_empty(cli.tools.as_ref()) {
        config.tools.enabled = enabled.clone();
    }
    if let Some(disabled) = non_empty(cli.disabled_tools.as_ref()) {
        config.tools.disabled = disabled.clone();
    }
    set(&mut config.tools.auto_approve, cli.auto_approve.as_ref());

    if let Some(disable) = cli.disable_subagents {
        config.agents.enable_subagents = !disable;
    }
}

fn apply_provider_override(config: &mut ResolvedConfig, provider: &ProviderOverride) {
    match provider {
        ProviderOverride::ByName(name) => {
            if let Some(profile) = config.providers.get(name) {
                let profile = profile.clone();
                config.provider = profile.provider;
                if let Some(model) = profile.model {
                    config.model = model;
                }
            } else {
                config.provider.name = name.clone();
            }
        }
        ProviderOverride::Inline(descriptor) => {
            config.provider = descriptor.clone();
        }
    }
}

fn non_empty(list: Option<&Vec<String>>) -> Option<&Vec<String>> {
    list.filter(|list| !list.is_empty())
}
