//! Structural validation of a resolved configuration.
//!
//! Every rule runs on every call; issues are collected in rule order and
//! returned together as one [`ValidationErrors`]. Rules only check shape, not
//! whether a model or tool name means anything.

use std::collections::HashSet;

use crate::error::{ValidationErrors, ValidationIssue};
use crate::schema::{
    AgentsConfig, ContextResource, LogDestinationKind, PersistenceConfig, ProviderOverride,
    ToolSource, ToolSourceAuth,
};
use crate::ResolvedConfig;

type Rule = fn(&ResolvedConfig, &mut Issues);

const RULES: &[Rule] = &[
    check_project_dir,
    check_provider,
    check_logging,
    check_context_resources,
    check_tool_sources,
    check_provider_profiles,
    check_persistence,
    check_agents,
];

/// Validate `config`, reporting every structural issue at once.
///
/// # Errors
///
/// Returns [`ValidationErrors`] holding one entry per failed check, in the
/// order the checks ran.
///
/// # Example
///
/// ```
/// use eddie_config::{validate, ResolvedConfig};
///
/// let mut config = ResolvedConfig::default();
/// assert!(validate(&config).is_ok());
///
/// config.project_dir.clear();
/// let errors = validate(&config).unwrap_err();
/// assert_eq!(errors.issues()[0].path, "projectDir");
/// ```
pub fn validate(config: &ResolvedConfig) -> Result<(), ValidationErrors> {
    let mut issues = Issues::default();
    for rule in RULES {
        rule(config, &mut issues);
    }

    match ValidationErrors::new(issues.0) {
        Some(errors) => {
            tracing::debug!(count = errors.len(), "configuration failed validation");
            Err(errors)
        }
        None => Ok(()),
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationIssue::new(path, message));
    }

    fn require_non_empty(&mut self, path: impl Into<String>, value: &str) {
        if is_blank(value) {
            self.push(path, "must not be empty");
        }
    }

    fn require_some_non_empty(&mut self, path: impl Into<String>, value: Option<&str>) {
        match value {
            Some(value) if !is_blank(value) => {}
            Some(_) => self.push(path, "must not be empty"),
            None => self.push(path, "is required"),
        }
    }

    fn require_unit_interval(&mut self, path: impl Into<String>, value: Option<f64>) {
        if let Some(value) = value {
            if !(0.0..=1.0).contains(&value) {
                self.push(path, format!("must be between 0 and 1, got {value}"));
            }
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_project_dir(config: &ResolvedConfig, issues: &mut Issues) {
    issues.require_non_empty("projectDir", &config.project_dir);
}

fn check_provider(config: &ResolvedConfig, issues: &mut Issues) {
    issues.require_non_empty("provider.name", &config.provider.name);
}

fn check_logging(config: &ResolvedConfig, issues: &mut Issues) {
    if let Some(destination) = &config.logging.destination {
        if destination.kind == LogDestinationKind::File {
            issues.require_some_non_empty("logging.destination.path", destination.path.as_deref());
        }
    }
}

fn check_context_resources(config: &ResolvedConfig, issues: &mut Issues) {
    for (index, resource) in config.context.resources.iter().enumerate() {
        check_context_resource(&format!("context.resources[{index}]"), resource, issues);
    }
}

fn check_context_resource(path: &str, resource: &ContextResource, issues: &mut Issues) {
    issues.require_non_empty(format!("{path}.id"), &resource.id);

    match resource.kind.as_str() {
        "bundle" => {
            if resource.include.iter().all(|glob| is_blank(glob)) {
                issues.push(
                    format!("{path}.include"),
                    "bundle resources need at least one include pattern",
                );
            }
        }
        "template" => {
            issues.require_some_non_empty(format!("{path}.template"), resource.template.as_deref());
        }
        other => issues.push(
            format!("{path}.type"),
            format!("unknown resource type '{other}', expected 'bundle' or 'template'"),
        ),
    }
}

fn check_tool_sources(config: &ResolvedConfig, issues: &mut Issues) {
    let mut seen = HashSet::new();
    for (index, source) in config.tools.sources.iter().enumerate() {
        let path = format!("tools.sources[{index}]");
        check_tool_source(&path, source, issues);

        if !is_blank(&source.id) && !seen.insert(source.id.as_str()) {
            issues.push(
                format!("{path}.id"),
                format!("duplicate tool source id '{}'", source.id),
            );
        }
    }
}

fn check_tool_source(path: &str, source: &ToolSource, issues: &mut Issues) {
    issues.require_non_empty(format!("{path}.id"), &source.id);
    if source.kind != "mcp" {
        issues.push(
            format!("{path}.type"),
            format!("unknown tool source type '{}', expected 'mcp'", source.kind),
        );
    }
    issues.require_non_empty(format!("{path}.url"), &source.url);

    if let Some(auth) = &source.auth {
        check_tool_auth(&format!("{path}.auth"), auth, issues);
    }
}

fn check_tool_auth(path: &str, auth: &ToolSourceAuth, issues: &mut Issues) {
    match auth.kind.as_str() {
        "none" => {}
        "basic" => {
            issues.require_some_non_empty(format!("{path}.username"), auth.username.as_deref());
            issues.require_some_non_empty(format!("{path}.password"), auth.password.as_deref());
        }
        "bearer" => {
            issues.require_some_non_empty(format!("{path}.token"), auth.token.as_deref());
        }
        other => issues.push(
            format!("{path}.type"),
            format!("unknown auth type '{other}', expected 'none', 'basic' or 'bearer'"),
        ),
    }
}

fn check_provider_profiles(config: &ResolvedConfig, issues: &mut Issues) {
    for (name, profile) in &config.providers {
        let path = format!("providers.{name}");
        issues.require_non_empty(format!("{path}.provider.name"), &profile.provider.name);
        if let Some(model) = &profile.model {
            issues.require_non_empty(format!("{path}.model"), model);
        }
    }
}

fn check_persistence(config: &ResolvedConfig, issues: &mut Issues) {
    let persistence: &PersistenceConfig = &config.api.persistence;
    if !persistence.driver.is_sql_server() {
        return;
    }

    let path = "api.persistence.connection";
    let Some(connection) = &persistence.connection else {
        issues.push(
            path,
            format!(
                "is required for the {} driver",
                persistence.driver.as_str()
            ),
        );
        return;
    };

    issues.require_some_non_empty(format!("{path}.host"), connection.host.as_deref());
    if connection.port.is_none() {
        issues.push(format!("{path}.port"), "must be a port number");
    }
    issues.require_some_non_empty(format!("{path}.database"), connection.database.as_deref());
    issues.require_some_non_empty(format!("{path}.user"), connection.user.as_deref());
    issues.require_some_non_empty(format!("{path}.password"), connection.password.as_deref());
}

fn check_agents(config: &ResolvedConfig, issues: &mut Issues) {
    let agents: &AgentsConfig = &config.agents;

    issues.require_non_empty("agents.mode", &agents.mode);
    issues.require_non_empty("agents.manager.prompt", &agents.manager.prompt);
    if let Some(provider) = &agents.manager.provider {
        check_provider_reference("agents.manager.provider", provider, issues);
    }

    issues.require_unit_interval(
        "agents.routing.confidenceThreshold",
        agents.routing.confidence_threshold,
    );
    if let Some(depth) = agents.routing.max_depth {
        if depth < 0 {
            issues.push(
                "agents.routing.maxDepth",
                format!("must be a non-negative integer, got {depth}"),
            );
        }
    }

    let mut seen = HashSet::new();
    for (index, agent) in agents.subagents.iter().enumerate() {
        let path = format!("agents.subagents[{index}]");

        if is_blank(&agent.id) {
            issues.push(format!("{path}.id"), "must not be empty");
        } else if !seen.insert(agent.id.as_str()) {
            issues.push(
                format!("{path}.id"),
                format!("duplicate subagent id '{}'", agent.id),
            );
        }

        if let Some(provider) = &agent.provider {
            check_provider_reference(&format!("{path}.provider"), provider, issues);
        }
        issues.require_unit_interval(format!("{path}.routingThreshold"), agent.routing_threshold);
    }
}

// Unknown profile names are accepted here and resolved at dispatch time.
fn check_provider_reference(path: &str, provider: &ProviderOverride, issues: &mut Issues) {
    match provider {
        ProviderOverride::ByName(name) => issues.require_non_empty(path, name),
        ProviderOverride::Inline(descriptor) => {
            issues.require_non_empty(format!("{path}.name"), &descriptor.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        AgentDefinition, LogDestination, PersistenceDriver, ProviderConfig, ProviderProfile,
        SqlConnectionConfig,
    };

    fn paths(config: &ResolvedConfig) -> Vec<String> {
        validate(config)
            .map(|()| Vec::new())
            .unwrap_or_else(|errors| errors.into_issues().into_iter().map(|i| i.path).collect())
    }

    fn tool_source(id: &str, url: &str) -> ToolSource {
        ToolSource {
            id: id.to_string(),
            url: url.to_string(),
            ..ToolSource::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&ResolvedConfig::default()).is_ok());
    }

    #[test]
    fn test_three_independent_defects_are_all_reported() {
        let mut config = ResolvedConfig::default();
        config.project_dir = String::new();
        config.tools.sources = vec![tool_source("docs", "")];
        config.agents.subagents = vec![
            AgentDefinition {
                id: "a".to_string(),
                ..AgentDefinition::default()
            },
            AgentDefinition {
                id: "b".to_string(),
                ..AgentDefinition::default()
            },
            AgentDefinition::default(),
        ];

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let paths: Vec<_> = errors.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["projectDir", "tools.sources[0].url", "agents.subagents[2].id"]
        );
        assert!(errors.to_string().contains("3 checks failed"));
    }

    #[test]
    fn test_invalid_profile_path() {
        let mut config = ResolvedConfig::default();
        config.providers.insert(
            "invalid".to_string(),
            ProviderProfile {
                provider: ProviderConfig::default(),
                model: Some(String::new()),
            },
        );
        assert_eq!(
            paths(&config),
            vec!["providers.invalid.provider.name", "providers.invalid.model"]
        );
    }

    #[test]
    fn test_tool_auth_shapes() {
        let mut config = ResolvedConfig::default();
        let mut basic = tool_source("a", "http://a");
        basic.auth = Some(ToolSourceAuth {
            kind: "basic".to_string(),
            username: Some("me".to_string()),
            ..ToolSourceAuth::default()
        });
        let mut bearer = tool_source("b", "http://b");
        bearer.auth = Some(ToolSourceAuth {
            kind: "bearer".to_string(),
            ..ToolSourceAuth::default()
        });
        let mut none = tool_source("c", "http://c");
        none.auth = Some(ToolSourceAuth {
            kind: "none".to_string(),
            ..ToolSourceAuth::default()
        });
        let mut odd = tool_source("d", "http://d");
        odd.auth = Some(ToolSourceAuth {
            kind: "oauth".to_string(),
            ..ToolSourceAuth::default()
        });
        config.tools.sources = vec![basic, bearer, none, odd];

        assert_eq!(
            paths(&config),
            vec![
                "tools.sources[0].auth.password",
                "tools.sources[1].auth.token",
                "tools.sources[3].auth.type",
            ]
        );
    }

    #[test]
    fn test_duplicate_and_mistyped_tool_sources() {
        let mut config = ResolvedConfig::default();
        let mut sse = tool_source("x", "http://two");
        sse.kind = "sse".to_string();
        config.tools.sources = vec![tool_source("x", "http://one"), sse];

        let errors = validate(&config).unwrap_err();
        let paths: Vec<_> = errors.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["tools.sources[1].type", "tools.sources[1].id"]);
        assert!(errors.issues()[1].message.contains("duplicate"));
    }

    #[test]
    fn test_sql_persistence_requires_connection() {
        let mut config = ResolvedConfig::default();
        config.api.persistence.driver = PersistenceDriver::Postgres;
        assert_eq!(paths(&config), vec!["api.persistence.connection"]);

        config.api.persistence.connection = Some(SqlConnectionConfig {
            host: Some("db".to_string()),
            database: Some("eddie".to_string()),
            user: Some(" ".to_string()),
            ..SqlConnectionConfig::default()
        });
        assert_eq!(
            paths(&config),
            vec![
                "api.persistence.connection.port",
                "api.persistence.connection.user",
                "api.persistence.connection.password",
            ]
        );
    }

    #[test]
    fn test_sqlite_and_memory_need_no_connection() {
        let mut config = ResolvedConfig::default();
        config.api.persistence.driver = PersistenceDriver::Sqlite;
        assert!(validate(&config).is_ok());
        config.api.persistence.driver = PersistenceDriver::Memory;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_agent_topology_rules() {
        let mut config = ResolvedConfig::default();
        config.agents.mode = " ".to_string();
        config.agents.manager.prompt = String::new();
        config.agents.routing.confidence_threshold = Some(1.5);
        config.agents.routing.max_depth = Some(-1);
        config.agents.subagents = vec![
            AgentDefinition {
                id: "dup".to_string(),
                routing_threshold: Some(-0.1),
                ..AgentDefinition::default()
            },
            AgentDefinition {
                id: "dup".to_string(),
                provider: Some(ProviderOverride::Inline(ProviderConfig::default())),
                ..AgentDefinition::default()
            },
        ];

        assert_eq!(
            paths(&config),
            vec![
                "agents.mode",
                "agents.manager.prompt",
                "agents.routing.confidenceThreshold",
                "agents.routing.maxDepth",
                "agents.subagents[0].routingThreshold",
                "agents.subagents[1].id",
                "agents.subagents[1].provider.name",
            ]
        );
    }

    #[test]
    fn test_unknown_profile_reference_is_accepted() {
        let mut config = ResolvedConfig::default();
        config.agents.subagents = vec![AgentDefinition {
            id: "a".to_string(),
            provider: Some(ProviderOverride::ByName("not-a-profile".to_string())),
            ..AgentDefinition::default()
        }];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_context_resource_shapes() {
        let mut config = ResolvedConfig::default();
        config.context.resources = vec![
            ContextResource {
                id: "bundle".to_string(),
                kind: "bundle".to_string(),
                ..ContextResource::default()
            },
            ContextResource {
                id: "tpl".to_string(),
                kind: "template".to_string(),
                ..ContextResource::default()
            },
            ContextResource {
                id: String::new(),
                kind: "snippet".to_string(),
                ..ContextResource::default()
            },
        ];
        assert_eq!(
            paths(&config),
            vec![
                "context.resources[0].include",
                "context.resources[1].template",
                "context.resources[2].id",
                "context.resources[2].type",
            ]
        );
    }

    #[test]
    fn test_file_destination_needs_path() {
        let mut config = ResolvedConfig::default();
        config.logging.destination = Some(LogDestination {
            kind: LogDestinationKind::File,
            path: None,
            pretty: false,
        });
        assert_eq!(paths(&config), vec!["logging.destination.path"]);
    }
}
