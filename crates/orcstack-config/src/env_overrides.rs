use super::{LogFormat, StackConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "ORCSTACK_";

/// Bucket holding the function artifact. Read without the ORCSTACK_ prefix.
pub const BUCKET_ENV: &str = "ORC_DEPLOYMENT_BUCKET";
/// Object key of the function artifact. Read without the ORCSTACK_ prefix.
pub const ARTIFACT_ENV: &str = "ORC_JAR_NAME";

/// Abstraction over environment-variable lookups so tests and embedders can
/// supply overrides without touching the process environment.
pub trait EnvSource {
    /// Get an ORCSTACK_-prefixed variable by its unprefixed key.
    fn get(&self, key: &str) -> Option<String>;

    /// Get a variable by its full name.
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides on top of the file/default config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut StackConfig, env: &E) -> Result<()> {
    // Deployment artifact location
    if let Some(bucket) = env.get_raw(BUCKET_ENV) {
        config.deployment.bucket = Some(bucket);
    }
    if let Some(artifact) = env.get_raw(ARTIFACT_ENV) {
        config.deployment.artifact = Some(artifact);
    }

    if let Some(name) = env.get("STACK_NAME") {
        config.stack_name = name;
    }

    // Function sizing
    if let Some(val) = get_env_u32(env, "FUNCTION_MEMORY_MB")? {
        config.function.memory_mb = val;
    }
    if let Some(val) = get_env_u64(env, "FUNCTION_TIMEOUT_SECS")? {
        config.function.timeout_secs = val;
    }

    // Logging
    if let Some(level) = env.get("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .context("Invalid ORCSTACK_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_u32<E: EnvSource>(env: &E, key: &str) -> Result<Option<u32>> {
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<u32>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match env.get(key) {
        Some(val) => {
            let parsed = val
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Map-backed environment; keys are stored with their full names.
    #[derive(Default)]
    pub(crate) struct MapEnv(pub HashMap<String, String>);

    impl MapEnv {
        pub(crate) fn with(mut self, key: &str, value: &str) -> Self {
            self.0.insert(key.to_string(), value.to_string());
            self
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_deployment_vars_are_unprefixed() {
        let env = MapEnv::default()
            .with("ORC_DEPLOYMENT_BUCKET", "my-artifacts")
            .with("ORC_JAR_NAME", "parser.jar")
            .with("ORCSTACK_ORC_JAR_NAME", "ignored.jar");

        let mut config = StackConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.deployment.bucket.as_deref(), Some("my-artifacts"));
        assert_eq!(config.deployment.artifact.as_deref(), Some("parser.jar"));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = StackConfig::from_toml_str(
            r#"
            stack_name = "FromFile"

            [deployment]
            bucket = "file-bucket"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        let env = MapEnv::default()
            .with("ORC_DEPLOYMENT_BUCKET", "env-bucket")
            .with("ORCSTACK_STACK_NAME", "FromEnv")
            .with("ORCSTACK_LOG_FORMAT", "json")
            .with("ORCSTACK_FUNCTION_MEMORY_MB", "1024");
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.stack_name, "FromEnv");
        assert_eq!(config.deployment.bucket.as_deref(), Some("env-bucket"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.function.memory_mb, 1024);
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let env = MapEnv::default().with("ORCSTACK_FUNCTION_TIMEOUT_SECS", "fifteen");
        let mut config = StackConfig::default();

        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("ORCSTACK_FUNCTION_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let env = MapEnv::default().with("ORCSTACK_LOG_FORMAT", "yaml");
        let mut config = StackConfig::default();
        assert!(apply_env_overrides(&mut config, &env).is_err());
    }
}
