// Configuration validation
//
// Presence of the deployment bucket and artifact decides the outcome; the
// values themselves are left to the provider. Function sizing and the stack
// name are checked against provider limits.

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

/// Longest stack name the provider accepts.
const MAX_STACK_NAME_LEN: usize = 128;

pub fn validate_config(config: &StackConfig) -> Result<ConfigOutcome> {
    validate_stack_name(&config.stack_name)?;
    validate_function_config(&config.function)?;

    let bucket = present(&config.deployment.bucket);
    let artifact = present(&config.deployment.artifact);

    let mut missing = Vec::new();
    if bucket.is_none() {
        missing.push(MissingField::Bucket);
    }
    if artifact.is_none() {
        missing.push(MissingField::Artifact);
    }

    match (bucket, artifact) {
        (Some(bucket), Some(artifact)) => Ok(ConfigOutcome::Ready(DeployConfig {
            stack_name: config.stack_name.clone(),
            bucket,
            artifact,
            function: config.function,
        })),
        _ => Ok(ConfigOutcome::MissingConfig(missing)),
    }
}

/// A value counts as present only if it has non-whitespace content.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_stack_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("stack_name must not be empty");
    }

    if name.len() > MAX_STACK_NAME_LEN {
        bail!(
            "stack_name must be at most {} characters, got {}",
            MAX_STACK_NAME_LEN,
            name.len()
        );
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        bail!("stack_name '{}' must start with an ASCII letter", name);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        bail!(
            "stack_name '{}' must contain only ASCII letters, digits, and hyphens",
            name
        );
    }

    Ok(())
}

fn validate_function_config(config: &FunctionConfig) -> Result<()> {
    if !(MIN_MEMORY_MB..=MAX_MEMORY_MB).contains(&config.memory_mb) {
        bail!(
            "function.memory_mb must be between {} and {}, got {}",
            MIN_MEMORY_MB,
            MAX_MEMORY_MB,
            config.memory_mb
        );
    }

    if config.timeout_secs == 0 {
        bail!("function.timeout_secs must be greater than 0");
    }

    if config.timeout_secs > MAX_FUNCTION_TIMEOUT_SECS {
        bail!(
            "function.timeout_secs must not exceed {} (15 minutes), got {}",
            MAX_FUNCTION_TIMEOUT_SECS,
            config.timeout_secs
        );
    }

    // Short timeouts shrink the queue visibility window too
    if config.timeout_secs < 60 {
        warn!(
            timeout_secs = config.timeout_secs,
            "function.timeout_secs is very short; large inputs may be redelivered"
        );
    }

    Ok(())
}
