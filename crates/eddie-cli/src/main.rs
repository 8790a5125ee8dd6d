//! Eddie CLI - Entry point

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use eddie_cli::{Cli, Status};
use eddie_config::{ConfigPaths, ConfigService};
use eddie_telemetry::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(status) => status.into(),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<Status> {
    // A missing .env is fine; a broken one is not.
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error).context("failed to load .env");
        }
    }

    let cli = Cli::parse();
    let paths = ConfigPaths::from_env().context("failed to determine config directories")?;
    let service = ConfigService::builder(paths)
        .with_overrides(cli.overrides.to_overrides())
        .build();

    init_logging(&eddie_cli::log_config(&service).await).context("failed to initialize logging")?;
    if let Some(level) = cli.overrides.ignored_log_level() {
        tracing::warn!(level, "ignoring unrecognised log level");
    }

    eddie_cli::run(
        &cli.command(),
        &service,
        cli.overrides.is_non_interactive(),
        &mut std::io::stdout(),
        shutdown_signal(),
    )
    .await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
