// orcstack - CLI for the ORC parser stack
//
// Resolves configuration from file, environment and flags, then hands the
// validated outcome to orcstack-core to declare, plan or synthesize the stack.

use anyhow::{Context, Result};
use orcstack_config::StackConfig;
use std::path::PathBuf;

pub mod commands;
mod init;

pub use init::init_tracing;

/// Values given on the command line. They override file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub bucket: Option<String>,
    pub artifact: Option<String>,
    pub stack_name: Option<String>,
    pub log_level: Option<String>,
}

/// Load configuration from all sources and apply CLI overrides on top.
pub fn load_config(overrides: &CliOverrides) -> Result<StackConfig> {
    let mut config = match &overrides.config {
        Some(path) => StackConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StackConfig::load().context("Failed to load configuration")?,
    };

    apply_cli_overrides(&mut config, overrides);
    Ok(config)
}

pub fn apply_cli_overrides(config: &mut StackConfig, overrides: &CliOverrides) {
    if let Some(bucket) = &overrides.bucket {
        config.deployment.bucket = Some(bucket.clone());
    }
    if let Some(artifact) = &overrides.artifact {
        config.deployment.artifact = Some(artifact.clone());
    }
    if let Some(name) = &overrides.stack_name {
        config.stack_name = name.clone();
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }
}
