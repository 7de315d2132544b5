// Configuration source loading.
//
// Priority order:
// 1. Environment variables
// 2. Explicit file path (CLI --config), else ORCSTACK_CONFIG
// 3. Default config file (./orcstack.toml)
// 4. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::StackConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "./orcstack.toml";

/// Load configuration from file (if any) and apply environment overrides.
pub fn load_config<E: EnvSource>(explicit: Option<&Path>, env: &E) -> Result<StackConfig> {
    let mut config = match locate_file(explicit, env) {
        Some(path) => read_file(&path)?,
        None => {
            debug!("No config file found; using defaults");
            StackConfig::default()
        }
    };

    env_overrides::apply_env_overrides(&mut config, env)?;
    Ok(config)
}

fn locate_file<E: EnvSource>(explicit: Option<&Path>, env: &E) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env.get("CONFIG") {
        return Some(PathBuf::from(path));
    }

    let default = Path::new(DEFAULT_CONFIG_FILE);
    default.exists().then(|| default.to_path_buf())
}

fn read_file(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = StackConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Environment source backed by the process environment.
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_overrides::tests::MapEnv;
    use std::io::Write;

    #[test]
    fn explicit_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [deployment]
            bucket = "file-bucket"
            artifact = "file.jar"
            "#
        )
        .unwrap();

        let env = MapEnv::default().with("ORC_JAR_NAME", "env.jar");
        let config = load_config(Some(file.path()), &env).unwrap();

        assert_eq!(config.deployment.bucket.as_deref(), Some("file-bucket"));
        assert_eq!(config.deployment.artifact.as_deref(), Some("env.jar"));
    }

    #[test]
    fn config_path_from_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stack_name = \"Pointed\"").unwrap();

        let env = MapEnv::default().with("ORCSTACK_CONFIG", &file.path().to_string_lossy());
        let config = load_config(None, &env).unwrap();
        assert_eq!(config.stack_name, "Pointed");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path), &MapEnv::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[function]\nmemory_mb = \"lots\"").unwrap();

        let err = load_config(Some(file.path()), &MapEnv::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
