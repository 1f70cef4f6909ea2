//! Load — engine config from TOML and environment variables.

use std::path::Path;

use super::error::ConfigError;
use super::model::EngineConfig;

pub const ENV_REQUEST_ID_KEY: &str = "TFLOG_REQUEST_ID_KEY";
pub const ENV_MAX_MESSAGE_LEN: &str = "TFLOG_MAX_MESSAGE_LEN";

impl EngineConfig {
    /// Load configuration.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load), reading overrides through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match path {
            Some(path) if path.exists() => {
                tracing::info!("Loading engine configuration from: {}", path.display());
                Self::from_file(path)?
            }
            Some(path) => {
                tracing::info!("Config file not found at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        let config = config.with_env_overrides(lookup)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from `lookup`; the real environment in production,
    /// a map in tests.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_REQUEST_ID_KEY) {
            self.request_id_key = key;
        }
        if let Some(raw) = lookup(ENV_MAX_MESSAGE_LEN) {
            self.max_fallback_message_len =
                raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    name: ENV_MAX_MESSAGE_LEN,
                    value: raw.clone(),
                })?;
        }
        Ok(self)
    }
}
