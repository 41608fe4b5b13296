//! Remote store port.
//!
//! The pipeline talks to the inventory backend only through [`RemoteStore`].
//! [`HttpRemote`] is the production implementation; tests use an in-memory
//! fake.

mod http;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{CatalogPage, ScanEntry};

pub use http::{HttpRemote, NoAuth, StaticToken, TokenSource};

// ── Error ───────────────────────────────────────────────────────────

/// Failure of a remote call. Any of these counts as "unreachable" for
/// duplicate detection and as a transport error for chunk submission.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),
}

// ── Wire types ──────────────────────────────────────────────────────

/// Which identifier an existence query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistsKind {
    Invoice,
    Serial,
}

/// Acknowledgment for one submitted chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAck {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

impl ChunkAck {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            rejected_reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            rejected_reason: Some(reason.into()),
        }
    }
}

// ── RemoteStore ─────────────────────────────────────────────────────

/// Capabilities the pipeline consumes from the inventory backend.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Return the subset of `values` already registered, matched
    /// case-insensitively.
    async fn query_exists(
        &self,
        kind: ExistsKind,
        values: &[String],
    ) -> Result<Vec<String>, RemoteError>;

    /// Register up to one chunk of entries.
    async fn submit_chunk(&self, entries: &[ScanEntry]) -> Result<ChunkAck, RemoteError>;

    /// Page through master items (1-based page).
    async fn list_catalog_items(
        &self,
        page: usize,
        query: &str,
    ) -> Result<CatalogPage, RemoteError>;
}

/// Run a remote call with an upper bound on its duration.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout(limit)),
    }
}
