//! Command implementations.
//!
//! Commands write their results to the given writer. Interactive output is
//! meant for people; non-interactive output is JSON, one document per result.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use eddie_config::defaults::CURRENT_CONFIG_VERSION;
use eddie_config::{
    ConfigError, ConfigFileSnapshot, ConfigFormat, ConfigService, FileWatcher, CONFIG_FILENAMES,
};
use serde::Serialize;
use serde_json::json;

use crate::args::Command;

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything worked.
    Success,
    /// The configuration is invalid or could not be loaded.
    Failure,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => Self::SUCCESS,
            Status::Failure => Self::FAILURE,
        }
    }
}

/// Run `command` against `service`.
///
/// `json` selects machine-readable output. `shutdown` ends `watch`; the
/// other commands ignore it.
///
/// # Errors
///
/// Returns load, write and output failures. `check` reports load failures
/// in its output and returns [`Status::Failure`] instead.
pub async fn run<W, F>(
    command: &Command,
    service: &ConfigService,
    json: bool,
    out: &mut W,
    shutdown: F,
) -> Result<Status>
where
    W: Write,
    F: Future<Output = ()>,
{
    match command {
        Command::Show { format } => show(service, *format, json, out).await,
        Command::Check => check(service, json, out).await,
        Command::Migrate { write } => migrate_file(service, *write, json, out).await,
        Command::Watch { debounce_ms } => {
            watch(service, Duration::from_millis(*debounce_ms), json, out, shutdown).await
        }
    }
}

async fn show<W: Write>(
    service: &ConfigService,
    format: Option<ConfigFormat>,
    json: bool,
    out: &mut W,
) -> Result<Status> {
    let loaded = service.load().await?;
    let config = loaded
        .config
        .unwrap_or_else(|| service.store().get_snapshot());

    let format = format.unwrap_or(if json {
        ConfigFormat::Json
    } else {
        ConfigFormat::Yaml
    });
    out.write_all(render(&config, format, json)?.as_bytes())?;
    Ok(Status::Success)
}

async fn check<W: Write>(service: &ConfigService, json: bool, out: &mut W) -> Result<Status> {
    match service.load().await {
        Ok(loaded) => {
            if json {
                let report = json!({
                    "valid": true,
                    "path": loaded.path,
                    "warnings": loaded.warnings,
                });
                writeln!(out, "{report}")?;
            } else {
                writeln!(out, "configuration is valid ({})", source(loaded.path.as_deref()))?;
                for warning in &loaded.warnings {
                    writeln!(out, "  warning: {warning}")?;
                }
            }
            Ok(Status::Success)
        }
        Err(error) => {
            let issues = error.issues().unwrap_or_default();
            if json {
                let report = json!({
                    "valid": false,
                    "error": error.to_string(),
                    "issues": issues,
                });
                writeln!(out, "{report}")?;
            } else if issues.is_empty() {
                writeln!(out, "configuration could not be loaded: {error}")?;
            } else {
                writeln!(out, "configuration is invalid ({} issue(s)):", issues.len())?;
                for issue in issues {
                    writeln!(out, "  - {issue}")?;
                }
            }
            Ok(Status::Failure)
        }
    }
}

async fn migrate_file<W: Write>(
    service: &ConfigService,
    write: bool,
    json: bool,
    out: &mut W,
) -> Result<Status> {
    let migrated = if write {
        service.migrate_file().await?
    } else {
        service.preview_migration().await?
    };
    let Some(snapshot) = migrated else {
        if json {
            writeln!(out, "{}", json!({ "path": null, "written": false }))?;
        } else {
            writeln!(out, "no config file found; nothing to migrate")?;
        }
        return Ok(Status::Success);
    };

    let path = snapshot.path.as_deref().unwrap_or(Path::new(""));
    // One warning per applied step.
    for warning in &snapshot.warnings {
        tracing::warn!(path = %path.display(), "{warning}");
    }
    if let Some(error) = &snapshot.error {
        tracing::warn!(path = %path.display(), %error, "upgraded file does not validate");
    }

    if json {
        let report = json!({
            "path": path,
            "format": snapshot.format,
            "version": CURRENT_CONFIG_VERSION,
            "warnings": snapshot.warnings,
            "written": write,
            "content": snapshot.content,
        });
        writeln!(out, "{report}")?;
    } else if write {
        if snapshot.warnings.is_empty() {
            writeln!(
                out,
                "{} is already at version {CURRENT_CONFIG_VERSION}; rewritten",
                path.display()
            )?;
        } else {
            writeln!(
                out,
                "upgraded {} to version {CURRENT_CONFIG_VERSION} ({} step(s))",
                path.display(),
                snapshot.warnings.len()
            )?;
        }
    } else {
        out.write_all(snapshot.content.as_bytes())?;
    }
    Ok(Status::Success)
}

async fn watch<W, F>(
    service: &ConfigService,
    debounce: Duration,
    json: bool,
    out: &mut W,
    shutdown: F,
) -> Result<Status>
where
    W: Write,
    F: Future<Output = ()>,
{
    let loaded = service.load().await?;
    report_loaded(&loaded, json, out)?;

    let mut watcher = build_watcher(service, loaded.path.as_deref(), debounce)?;
    tracing::info!(paths = ?watcher.config().paths, "watching configuration");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = watcher.next() => {
                let Some(event) = event else { break };
                tracing::debug!(path = %event.path.display(), kind = ?event.kind, "config file changed");
                match service.reload().await {
                    Ok(snapshot) => report_loaded(&snapshot, json, out)?,
                    Err(error) => {
                        tracing::error!(%error, "reload failed; keeping previous configuration");
                    }
                }
            }
        }
    }
    Ok(Status::Success)
}

fn build_watcher(
    service: &ConfigService,
    path: Option<&Path>,
    debounce: Duration,
) -> Result<FileWatcher, ConfigError> {
    let builder = FileWatcher::builder().with_debounce(debounce);
    let builder = match path {
        Some(path) => builder.watch_file(path)?,
        None => {
            // Nothing loaded yet: wait for any candidate name to appear.
            let mut builder = builder.watch_file_names(CONFIG_FILENAMES);
            for root in service.paths().search_roots() {
                if root.is_dir() {
                    builder = builder.watch_path(root)?;
                }
            }
            builder
        }
    };
    builder.build()
}

fn report_loaded<W: Write>(snapshot: &ConfigFileSnapshot, json: bool, out: &mut W) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(snapshot)?)?;
    } else if let Some(config) = &snapshot.config {
        writeln!(
            out,
            "loaded {}: model {}, provider {}",
            source(snapshot.path.as_deref()),
            config.model,
            config.provider.name
        )?;
    }
    out.flush()?;
    Ok(())
}

fn render<T: Serialize>(value: &T, format: ConfigFormat, compact: bool) -> Result<String> {
    let text = match format {
        ConfigFormat::Json if compact => serde_json::to_string(value)? + "\n",
        ConfigFormat::Json => serde_json::to_string_pretty(value)? + "\n",
        ConfigFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(text)
}

fn source(path: Option<&Path>) -> String {
    path.map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string())
}
