//! Commands run end to end against a temporary config directory.

use std::fs;
use std::time::Duration;

use clap::Parser;
use eddie_cli::{run, Cli, Status};
use eddie_config::{ConfigPaths, ConfigService};
use tempfile::TempDir;

async fn run_in(dir: &TempDir, args: &[&str]) -> (Status, String) {
    run_until(dir, args, std::future::ready(())).await
}

async fn run_until(
    dir: &TempDir,
    args: &[&str],
    shutdown: impl std::future::Future<Output = ()>,
) -> (Status, String) {
    let cli = Cli::try_parse_from(std::iter::once("eddie").chain(args.iter().copied())).unwrap();
    let service = ConfigService::builder(ConfigPaths::new(dir.path(), dir.path()))
        .with_overrides(cli.overrides.to_overrides())
        .build();

    let mut out = Vec::new();
    let status = run(
        &cli.command(),
        &service,
        cli.overrides.is_non_interactive(),
        &mut out,
        shutdown,
    )
    .await
    .unwrap();
    (status, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_show_applies_overrides_over_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("eddie.config.yaml"),
        "model: file-model\nlogging:\n  level: warn\ntools:\n  autoApprove: false\n",
    )
    .unwrap();

    let (status, out) = run_in(
        &dir,
        &["--model", "cli-model", "--auto-approve", "--non-interactive", "show"],
    )
    .await;
    assert_eq!(status, Status::Success);

    let config: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(config["model"], "cli-model");
    assert_eq!(config["logging"]["level"], "warn");
    assert_eq!(config["logLevel"], "warn");
    assert_eq!(config["tools"]["autoApprove"], true);
}

#[tokio::test]
async fn test_show_defaults_as_yaml() {
    let dir = TempDir::new().unwrap();
    let (status, out) = run_in(&dir, &[]).await;
    assert_eq!(status, Status::Success);
    assert!(out.contains("model: gpt-4o-mini"));
}

#[tokio::test]
async fn test_check_lists_every_issue() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".eddierc"),
        "projectDir: ''\ntools:\n  sources:\n    - id: docs\n",
    )
    .unwrap();

    let (status, out) = run_in(&dir, &["check"]).await;
    assert_eq!(status, Status::Failure);
    assert!(out.starts_with("configuration is invalid (2 issue(s)):"));
    assert!(out.contains("  - projectDir: must not be empty"));
    assert!(out.contains("tools.sources[0].url"));
}

#[tokio::test]
async fn test_check_json_reports_migration_warnings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".eddierc"), "tokenizerProvider: tiktoken\n").unwrap();

    let (status, out) = run_in(&dir, &["check", "--non-interactive"]).await;
    assert_eq!(status, Status::Success);

    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["warnings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_check_missing_explicit_file_fails() {
    let dir = TempDir::new().unwrap();
    let (status, out) = run_in(&dir, &["--config", "nope.yaml", "check"]).await;
    assert_eq!(status, Status::Failure);
    assert!(out.contains("config file not found at nope.yaml"));
}

#[tokio::test]
async fn test_migrate_prints_without_writing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".eddierc");
    let legacy = "disabledTools:\n  - bash\n";
    fs::write(&path, legacy).unwrap();

    let (status, out) = run_in(&dir, &["migrate"]).await;
    assert_eq!(status, Status::Success);
    assert!(out.contains("version: 2"));
    assert!(out.contains("disabled:"));
    assert!(!out.contains("disabledTools"));
    assert_eq!(fs::read_to_string(&path).unwrap(), legacy);
}

#[tokio::test]
async fn test_migrate_write_upgrades_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eddie.config.json");
    fs::write(&path, r#"{ "logFile": "eddie.log" }"#).unwrap();

    let (status, out) = run_in(&dir, &["migrate", "--write"]).await;
    assert_eq!(status, Status::Success);
    assert!(out.starts_with("upgraded "));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["version"], 2);
    assert_eq!(written["logging"]["destination"]["type"], "file");
    assert!(written.get("logFile").is_none());
}

#[tokio::test]
async fn test_migrate_write_targets_the_explicit_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    let path = dir.path().join("nested").join("legacy.yml");
    fs::write(&path, "disabledTools:\n  - bash\n").unwrap();

    let (status, out) = run_in(
        &dir,
        &["--config", "nested/legacy.yml", "--non-interactive", "migrate", "--write"],
    )
    .await;
    assert_eq!(status, Status::Success);

    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["written"], true);
    assert_eq!(report["path"], path.to_string_lossy().as_ref());
    assert_eq!(report["content"], fs::read_to_string(&path).unwrap());
    assert!(!report["warnings"].as_array().unwrap().is_empty());
    assert!(!dir.path().join("eddie.config.yaml").exists());
}

#[tokio::test]
async fn test_migrate_without_file() {
    let dir = TempDir::new().unwrap();
    let (status, out) = run_in(&dir, &["migrate"]).await;
    assert_eq!(status, Status::Success);
    assert_eq!(out, "no config file found; nothing to migrate\n");
}

#[tokio::test]
async fn test_watch_reports_initial_load_and_stops() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("eddie.config.yaml"), "model: first\n").unwrap();

    let (status, out) = run_in(&dir, &["watch"]).await;
    assert_eq!(status, Status::Success);
    assert!(out.starts_with("loaded "));
    assert!(out.contains("model first"));
}

#[tokio::test]
async fn test_watch_reloads_on_change() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eddie.config.yaml");
    fs::write(&path, "model: first\n").unwrap();

    let writer = {
        let path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            tokio::fs::write(&path, "model: second\n").await.unwrap();
        })
    };

    let (status, out) = run_until(
        &dir,
        &["watch", "--debounce-ms", "20", "--non-interactive"],
        tokio::time::sleep(Duration::from_millis(1500)),
    )
    .await;
    writer.await.unwrap();
    assert_eq!(status, Status::Success);

    let snapshots: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(snapshots[0]["config"]["model"], "first");
    // Filesystem notifications are unreliable on some CI hosts.
    if let Some(last) = snapshots.last().filter(|_| snapshots.len() > 1) {
        assert_eq!(last["config"]["model"], "second");
    }
}

#[tokio::test]
async fn test_log_config_follows_resolved_logging() {
    let dir = TempDir::new().unwrap();
    let paths = ConfigPaths::new(dir.path(), dir.path());

    let service = ConfigService::builder(paths.clone()).build();
    let log = eddie_cli::log_config(&service).await;
    assert_eq!(log.destination, eddie_config::LogDestinationKind::Stderr);
    assert_eq!(log.level, eddie_config::LogLevel::Info);

    fs::write(
        dir.path().join(".eddierc"),
        "logging:\n  level: debug\n  destination:\n    type: file\n    path: eddie.log\n",
    )
    .unwrap();
    let cli = Cli::try_parse_from(["eddie", "--log-level", "error"]).unwrap();
    let service = ConfigService::builder(paths)
        .with_overrides(cli.overrides.to_overrides())
        .build();
    let log = eddie_cli::log_config(&service).await;
    assert_eq!(log.destination, eddie_config::LogDestinationKind::File);
    assert_eq!(log.level, eddie_config::LogLevel::Error);
    assert!(log.json_format);
}
