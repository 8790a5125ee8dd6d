//! End-to-end tests through the file boundary.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use eddie_config::{
    compose, migrate, parse_source, validate, CliOverrides, ConfigError, ConfigFormat,
    ConfigPaths, ConfigService, LogLevel, PersistenceDriver, ProviderOverride, ResolvedConfig,
};
use parking_lot::Mutex;
use tempfile::TempDir;

fn service(dir: &TempDir, overrides: CliOverrides) -> ConfigService {
    ConfigService::builder(ConfigPaths::new(dir.path(), dir.path()))
        .with_overrides(overrides)
        .build()
}

#[tokio::test]
async fn test_precedence_scenario_publishes_exact_config_once() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("eddie.config.json"),
        r#"{ "version": 2, "model": "file-model", "logging": { "level": "warn" } }"#,
    )
    .unwrap();

    let service = service(
        &dir,
        CliOverrides {
            model: Some("cli-model".to_string()),
            log_level: Some(LogLevel::Error),
            ..CliOverrides::default()
        },
    );

    let calls: Arc<Mutex<Vec<ResolvedConfig>>> = Arc::default();
    let sink = Arc::clone(&calls);
    let _subscription = service
        .store()
        .subscribe(move |config: &ResolvedConfig| sink.lock().push(config.clone()));

    let loaded = service.load().await.unwrap();
    let config = loaded.config.unwrap();

    assert_eq!(config.model, "cli-model");
    assert_eq!(config.logging.level, LogLevel::Error);
    assert_eq!(config.log_level, LogLevel::Error);
    assert_eq!(loaded.format, ConfigFormat::Json);
    assert_eq!(*calls.lock(), vec![config]);

    // Loading the same inputs again is not a change.
    service.load().await.unwrap();
    assert_eq!(calls.lock().len(), 1);
}

#[tokio::test]
async fn test_explicit_config_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let service = service(
        &dir,
        CliOverrides {
            config: Some("missing/eddie.yaml".into()),
            ..CliOverrides::default()
        },
    );

    let err = service.load().await.unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
    assert_eq!(err.to_string(), "config file not found at missing/eddie.yaml");
}

#[tokio::test]
async fn test_legacy_file_is_migrated_on_write() {
    let dir = TempDir::new().unwrap();
    let legacy = "subagents:\n  - id: reviewer\n    provider: local\nlogFile: eddie.log\n";
    fs::write(dir.path().join(".eddierc"), legacy).unwrap();

    let service = service(&dir, CliOverrides::default());
    let loaded = service.load().await.unwrap();
    assert_eq!(loaded.warnings.len(), 2);

    let config = loaded.config.unwrap();
    assert_eq!(config.agents.subagents[0].id, "reviewer");
    assert_eq!(
        config.agents.subagents[0].provider,
        Some(ProviderOverride::ByName("local".to_string()))
    );

    // Writing the loaded content back persists the upgraded shape in place.
    let written = service.write_source(&loaded.content, None, None).await.unwrap();
    assert_eq!(written.path, Some(dir.path().join(".eddierc")));
    assert_eq!(written.format, ConfigFormat::Yaml);
    assert_eq!(written.warnings.len(), 2);

    let reread = service.load().await.unwrap();
    assert!(reread.warnings.is_empty());
    assert_eq!(reread.input.version, Some(2));
    assert!(reread.input.extra.is_empty());
}

#[tokio::test]
async fn test_profile_override_through_service() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("eddie.config.yaml"),
        "version: 2\nproviders:\n  local:\n    provider:\n      name: ollama\n    model: llama3\n",
    )
    .unwrap();

    let service = service(
        &dir,
        CliOverrides {
            provider: Some(ProviderOverride::ByName("local".to_string())),
            ..CliOverrides::default()
        },
    );
    let config = service.load().await.unwrap().config.unwrap();
    assert_eq!(config.provider.name, "ollama");
    assert_eq!(config.model, "llama3");
}

#[tokio::test]
async fn test_validation_failure_lists_every_issue() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("eddie.config.yaml"),
        concat!(
            "version: 2\n",
            "projectDir: ''\n",
            "tools:\n  sources:\n    - id: docs\n",
            "agents:\n  subagents:\n    - id: a\n    - id: b\n    - name: nameless\n",
        ),
    )
    .unwrap();

    let err = service(&dir, CliOverrides::default())
        .load()
        .await
        .unwrap_err();
    let paths: Vec<_> = err
        .issues()
        .unwrap()
        .iter()
        .map(|issue| issue.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec!["projectDir", "tools.sources[0].url", "agents.subagents[2].id"]
    );

    let rendered = err.to_string();
    assert!(rendered.contains("3 checks failed"));
    assert!(rendered.contains("agents.subagents[2].id"));
}

#[tokio::test]
async fn test_written_file_lands_inside_config_root() {
    let dir = TempDir::new().unwrap();
    let service = service(&dir, CliOverrides::default());

    let snapshot = service
        .write_source(
            "model: nested\n",
            Some(ConfigFormat::Yaml),
            Some(Path::new("profiles/dev/.eddierc")),
        )
        .await
        .unwrap();

    let expected = dir.path().join("profiles/dev/.eddierc");
    assert_eq!(snapshot.path.as_deref(), Some(expected.as_path()));
    assert!(fs::read_to_string(expected).unwrap().contains("model: nested"));
}

fn issue_paths(source: &str) -> (ResolvedConfig, Vec<String>) {
    let input = parse_source(source, ConfigFormat::Json).unwrap();
    let migrated = migrate(input).unwrap().input;
    let config = compose(&ResolvedConfig::default(), &migrated, &CliOverrides::default());
    let paths = match validate(&config) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.issues().iter().map(|i| i.path.clone()).collect(),
    };
    (config, paths)
}

#[test]
fn test_mistyped_subagent_id_is_reported_at_its_index() {
    let (config, paths) =
        issue_paths(r#"{"version":2,"agents":{"subagents":[{"id":"good"},{"id":7}]}}"#);
    assert_eq!(config.agents.subagents.len(), 2);
    assert_eq!(paths, vec!["agents.subagents[1].id"]);
}

#[test]
fn test_mistyped_connection_host_keeps_sql_driver() {
    let (config, paths) = issue_paths(
        r#"{"version":2,"api":{"persistence":{"driver":"postgres","connection":{
            "host":5,"port":5432,"database":"eddie","user":"eddie","password":"secret"}}}}"#,
    );
    assert_eq!(config.api.persistence.driver, PersistenceDriver::Postgres);
    assert_eq!(paths, vec!["api.persistence.connection.host"]);
}

#[test]
fn test_mistyped_tool_source_url_is_reported() {
    let (config, paths) = issue_paths(
        r#"{"version":2,"tools":{"sources":[
            {"id":"docs","url":"http://localhost:7000/mcp"},
            {"id":"search","url":42}]}}"#,
    );
    assert_eq!(config.tools.sources.len(), 2);
    assert_eq!(paths, vec!["tools.sources[1].url"]);
}
