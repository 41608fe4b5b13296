use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for the staging pipeline.
///
/// Deserializes from the `[pipeline]` table of the CLI config; any field
/// left out keeps its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Entries per remote submission.
    pub chunk_size: usize,

    /// Maximum number of staged entries.
    pub max_batch: usize,

    /// Upper bound on any single remote call, in seconds.
    pub remote_timeout_secs: u64,

    /// KV key the staged batch is mirrored under.
    pub slot: String,

    /// Auto-scan settle window, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            max_batch: 2000,
            remote_timeout_secs: 15,
            slot: "inbound:staging".to_string(),
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be at least 1")]
    ZeroChunkSize,

    #[error("max_batch must be at least 1")]
    ZeroBatch,

    #[error("remote_timeout_secs must be at least 1")]
    ZeroTimeout,

    #[error("slot name must not be empty")]
    EmptySlot,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.max_batch == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        if self.remote_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.slot.trim().is_empty() {
            return Err(ConfigError::EmptySlot);
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
