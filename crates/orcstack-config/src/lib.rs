// orcstack-config - Configuration for the ORC parser stack
//
// Supports configuration from multiple sources:
// 1. CLI flags (applied by the binary, highest priority)
// 2. Environment variables (ORC_DEPLOYMENT_BUCKET, ORC_JAR_NAME, ORCSTACK_*)
// 3. Config file path from ORCSTACK_CONFIG env var
// 4. Default config file location (./orcstack.toml)
// 5. Built-in defaults (lowest priority)
//
// Validation never fails on a missing bucket or artifact. It reports them
// through `ConfigOutcome::MissingConfig` so callers decide what to do.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ARTIFACT_ENV, BUCKET_ENV, ENV_PREFIX};
pub use sources::StdEnvSource;

/// Smallest memory size the compute provider accepts.
pub const MIN_MEMORY_MB: u32 = 128;
/// Largest memory size the compute provider accepts.
pub const MAX_MEMORY_MB: u32 = 10_240;
/// Longest timeout the compute provider accepts (15 minutes).
pub const MAX_FUNCTION_TIMEOUT_SECS: u64 = 900;

/// Top-level stack configuration as read from file, env and CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    #[serde(default = "default_stack_name")]
    pub stack_name: String,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub function: FunctionConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

fn default_stack_name() -> String {
    "OrcParserStack".to_string()
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: default_stack_name(),
            deployment: DeploymentConfig::default(),
            function: FunctionConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Location of the deployable artifact. Both values are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

/// Sizing of the compute function.
///
/// There is no separate queue setting: the queue visibility timeout is
/// always derived from `timeout_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_memory_mb() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    MAX_FUNCTION_TIMEOUT_SECS
}

impl FunctionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            memory_mb: default_memory_mb(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// A required deployment value that was absent or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingField {
    Bucket,
    Artifact,
}

impl MissingField {
    /// Environment variable that supplies this field.
    pub fn env_var(&self) -> &'static str {
        match self {
            MissingField::Bucket => BUCKET_ENV,
            MissingField::Artifact => ARTIFACT_ENV,
        }
    }

    /// Config file key that supplies this field.
    pub fn config_key(&self) -> &'static str {
        match self {
            MissingField::Bucket => "deployment.bucket",
            MissingField::Artifact => "deployment.artifact",
        }
    }
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.env_var(), self.config_key())
    }
}

/// Configuration that passed the presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub stack_name: String,
    pub bucket: String,
    pub artifact: String,
    pub function: FunctionConfig,
}

impl DeployConfig {
    /// Build a ready config with default function sizing.
    pub fn new(bucket: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            stack_name: default_stack_name(),
            bucket: bucket.into(),
            artifact: artifact.into(),
            function: FunctionConfig::default(),
        }
    }
}

/// Result of validating a [`StackConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    Ready(DeployConfig),
    MissingConfig(Vec<MissingField>),
}

impl ConfigOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConfigOutcome::Ready(_))
    }

    pub fn missing(&self) -> &[MissingField] {
        match self {
            ConfigOutcome::Ready(_) => &[],
            ConfigOutcome::MissingConfig(fields) => fields,
        }
    }
}

impl StackConfig {
    /// Load configuration from the default file location and process environment.
    pub fn load() -> Result<Self> {
        sources::load_config(None, &StdEnvSource)
    }

    /// Load configuration from an explicit file, then apply process environment.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_config(Some(path.as_ref()), &StdEnvSource)
    }

    /// Parse a TOML document into a config, filling unset fields with defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check required values and sanity-check the rest.
    pub fn validate(&self) -> Result<ConfigOutcome> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StackConfig::default();
        assert_eq!(config.stack_name, "OrcParserStack");
        assert_eq!(config.function.memory_mb, 512);
        assert_eq!(config.function.timeout(), Duration::from_secs(15 * 60));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.deployment.bucket.is_none());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let config = StackConfig::from_toml_str(
            r#"
            [deployment]
            bucket = "my-artifacts"

            [function]
            memory_mb = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.deployment.bucket.as_deref(), Some("my-artifacts"));
        assert!(config.deployment.artifact.is_none());
        assert_eq!(config.function.memory_mb, 1024);
        assert_eq!(config.function.timeout_secs, 900);
        assert_eq!(config.stack_name, "OrcParserStack");
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        let result = StackConfig::from_toml_str(
            r#"
            [deployment]
            bukket = "typo"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_field_display_names_env_var() {
        assert_eq!(
            MissingField::Bucket.to_string(),
            "ORC_DEPLOYMENT_BUCKET (deployment.bucket)"
        );
        assert_eq!(MissingField::Artifact.env_var(), "ORC_JAR_NAME");
    }
}
