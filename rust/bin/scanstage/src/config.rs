//! Client configuration.
//!
//! Reads/writes `~/.scanstage/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use scanstage_inbound::PipelineConfig;

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Inventory server URL (e.g. "http://localhost:8080").
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Bearer token for the inventory API. Empty means anonymous.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Staging database file (default: ~/.scanstage/staging.redb).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,

    pub pipeline: PipelineConfig,
}

impl ClientConfig {
    /// Default config file path: ~/.scanstage/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where the staged batch lives on disk.
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(p) => PathBuf::from(p),
            None => dirs_path().join("staging.redb"),
        }
    }
}

/// Return the scanstage config directory (~/.scanstage).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".scanstage")
}
