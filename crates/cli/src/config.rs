use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tflog::EngineConfig;

use crate::report::{Mode, OutputFormat, SortKey};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Report defaults; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub mode: Mode,
    pub sort: SortKey,
    pub output: OutputFormat,
    pub limit: usize,
    pub filter_level: Option<String>,
    pub grep: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl CliConfig {
    /// Load configuration from tflog.toml, an explicit file and environment
    /// variables
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        // Start with compile-time defaults so missing keys fall back to them
        let defaults = config::Config::try_from(&CliConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("tflog").required(false));

        if let Some(path) = explicit {
            tracing::info!("Loading configuration from: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Double underscore for nested keys: TFLOG__REPORT__SORT=timestamp
        builder = builder.add_source(
            config::Environment::with_prefix("TFLOG")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: CliConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Flat engine overrides (TFLOG_REQUEST_ID_KEY, TFLOG_MAX_MESSAGE_LEN)
        config.engine = config
            .engine
            .with_env_overrides(|name| std::env::var(name).ok())
            .context("Invalid engine environment override")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level must not be empty");
        }
        self.engine
            .validate()
            .map_err(|e| anyhow::anyhow!("engine: {}", e))?;
        Ok(())
    }
}
