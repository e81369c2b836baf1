//! Layered configuration: defaults, TOML file, `CLINIC_*` env vars, flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub session_path: PathBuf,
    pub timeout_secs: u64,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub session_path: Option<PathBuf>,
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clinic-console")
}

pub fn default_config_path() -> PathBuf {
    app_dir().join("config.toml")
}

pub fn default_session_path() -> PathBuf {
    app_dir().join("session.db")
}

impl ConsoleConfig {
    /// Load configuration. An explicit `file` must exist; the default one is optional.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let (path, required) = match file {
            Some(path) => (path.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        let mut builder = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default(
                "session_path",
                default_session_path().to_string_lossy().to_string(),
            )?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(Environment::with_prefix("CLINIC"));

        if let Some(api_url) = &overrides.api_url {
            builder = builder.set_override("api_url", api_url.as_str())?;
        }
        if let Some(session_path) = &overrides.session_path {
            builder = builder.set_override(
                "session_path",
                session_path.to_string_lossy().to_string(),
            )?;
        }

        let config: ConsoleConfig = builder
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_values_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "api_url = \"https://clinic.test/api\"").unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = ConsoleConfig::load(Some(&path), &Overrides::default()).unwrap();
        assert_eq!(config.api_url, "https://clinic.test/api");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.session_path, default_session_path());

        let overrides = Overrides {
            api_url: Some("http://override/api".into()),
            session_path: Some(dir.path().join("s.db")),
        };
        let config = ConsoleConfig::load(Some(&path), &overrides).unwrap();
        assert_eq!(config.api_url, "http://override/api");
        assert_eq!(config.session_path, dir.path().join("s.db"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(ConsoleConfig::load(Some(&missing), &Overrides::default()).is_err());
    }
}
