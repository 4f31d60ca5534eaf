//! Configuration management for the CLI

use crate::output::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wq_lib::ClientConfig;

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Prediction service URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("wqc").join("config.json"))
    }
}

/// Pick the service URL: flag or env first, then the config file, then
/// the library's own environment lookup and default
pub fn resolve_client_config(service_url: Option<&str>, file: &Config) -> Result<ClientConfig> {
    if let Some(url) = service_url {
        return Ok(ClientConfig::new(url));
    }

    if let Some(url) = &file.service_url {
        return Ok(ClientConfig::new(url.clone()));
    }

    ClientConfig::load().context("Failed to load prediction service configuration")
}
