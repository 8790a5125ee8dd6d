//! Schema migrations for persisted configuration.
//!
//! Migrations form a chain of single-version steps. [`Migrator::migrate`]
//! looks up the step registered for the input's current version, applies it,
//! and repeats until the input reaches the target version. Steps consume the
//! input by value, so an already-current input is handed straight back.

use serde::de::DeserializeOwned;

use crate::defaults::CURRENT_CONFIG_VERSION;
use crate::input::{RawConfigInput, RawToolsConfig};
use crate::schema::{AgentDefinition, LogDestination};
use crate::ConfigError;

/// A migration step body: upgrades an input by one version and returns the
/// user-facing warning describing what happened.
pub type MigrationFn = fn(RawConfigInput) -> (RawConfigInput, String);

/// One transition in the migration chain.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    /// Version this step reads.
    pub from: u32,
    /// Version this step produces (always `from + 1`).
    pub to: u32,
    apply: MigrationFn,
}

impl MigrationStep {
    /// Register a step from `from` to `from + 1`.
    pub const fn new(from: u32, apply: MigrationFn) -> Self {
        Self {
            from,
            to: from + 1,
            apply,
        }
    }
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful migration.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationResult {
    /// Input at the target version.
    pub input: RawConfigInput,
    /// `(from, to)` pairs of the steps applied, in order.
    pub applied: Vec<(u32, u32)>,
    /// One warning per applied step, in order.
    pub warnings: Vec<String>,
}

impl MigrationResult {
    /// Whether any step ran.
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// The registered migration chain.
#[derive(Debug, Clone)]
pub struct Migrator {
    target: u32,
    steps: Vec<MigrationStep>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::standard()
    }
}

impl Migrator {
    /// Chain ending at [`CURRENT_CONFIG_VERSION`].
    pub fn standard() -> Self {
        Self::new(
            CURRENT_CONFIG_VERSION,
            vec![
                MigrationStep::new(0, migrate_v0_to_v1),
                MigrationStep::new(1, migrate_v1_to_v2),
            ],
        )
    }

    /// Custom chain ending at `target`.
    pub fn new(target: u32, steps: Vec<MigrationStep>) -> Self {
        Self { target, steps }
    }

    /// Version inputs are upgraded to.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Upgrade `input` to the target version.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnsupportedVersion`] if the input is newer than the
    ///   target.
    /// - [`ConfigError::NoMigrationPath`] if an intermediate version has no
    ///   registered step.
    pub fn migrate(&self, input: RawConfigInput) -> Result<MigrationResult, ConfigError> {
        let mut version = input.declared_version();
        if version > self.target {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: self.target,
            });
        }

        let mut input = input;
        let mut applied = Vec::new();
        let mut warnings = Vec::new();

        while version < self.target {
            let step = self
                .steps
                .iter()
                .find(|step| step.from == version)
                .ok_or(ConfigError::NoMigrationPath { from: version })?;

            let (mut next, warning) = (step.apply)(input);
            next.version = Some(step.to);
            tracing::debug!(from = step.from, to = step.to, "applied config migration");

            input = next;
            applied.push((step.from, step.to));
            warnings.push(warning);
            version = step.to;
        }

        Ok(MigrationResult {
            input,
            applied,
            warnings,
        })
    }
}

/// Upgrade `input` with the standard chain.
pub fn migrate(input: RawConfigInput) -> Result<MigrationResult, ConfigError> {
    Migrator::standard().migrate(input)
}

fn upgrade_warning(from: u32, to: u32) -> String {
    format!("Configuration version {from} was automatically upgraded to version {to}.")
}

fn take_legacy<T: DeserializeOwned>(input: &mut RawConfigInput, key: &str) -> Option<T> {
    let value = input.extra.shift_remove(key)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            tracing::debug!(key, %error, "dropping malformed legacy config key");
            None
        }
    }
}

// v0 kept subagents at the top level and had a bare `logFile` path.
fn migrate_v0_to_v1(mut input: RawConfigInput) -> (RawConfigInput, String) {
    if let Some(subagents) = take_legacy::<Vec<AgentDefinition>>(&mut input, "subagents") {
        let agents = input.agents.get_or_insert_with(Default::default);
        if agents.subagents.is_none() {
            agents.subagents = Some(subagents);
        }
    }

    if let Some(path) = take_legacy::<String>(&mut input, "logFile") {
        if !path.trim().is_empty() {
            let logging = input.logging.get_or_insert_with(Default::default);
            if logging.destination.is_none() {
                logging.destination = Some(LogDestination::file(path));
            }
        }
    }

    (input, upgrade_warning(0, 1))
}

// v1 had `tokenizerProvider` and `disabledTools` at the top level.
fn migrate_v1_to_v2(mut input: RawConfigInput) -> (RawConfigInput, String) {
    if let Some(provider) = take_legacy::<String>(&mut input, "tokenizerProvider") {
        let tokenizer = input.tokenizer.get_or_insert_with(Default::default);
        if tokenizer.provider.is_none() {
            tokenizer.provider = Some(provider);
        }
    }

    if let Some(disabled) = take_legacy::<Vec<String>>(&mut input, "disabledTools") {
        let tools = input.tools.get_or_insert_with(RawToolsConfig::default);
        if tools.disabled.is_none() {
            tools.disabled = Some(disabled);
        }
    }

    (input, upgrade_warning(1, 2))
}
