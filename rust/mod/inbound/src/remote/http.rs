use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CatalogPage, ScanEntry};
use super::{ChunkAck, ExistsKind, RemoteError, RemoteStore};

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable bearer token provider, consulted before every request.
/// `Ok(None)` sends the request without an Authorization header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, RemoteError>;
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, RemoteError> {
        Ok(None)
    }
}

/// A token obtained elsewhere (e.g. saved by the login screen).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, RemoteError> {
        if self.0.is_empty() {
            return Err(RemoteError::Auth("empty token".into()));
        }
        Ok(Some(self.0.clone()))
    }
}

// ── Request / response bodies ───────────────────────────────────────

#[derive(Serialize)]
struct ExistsRequest<'a> {
    kind: ExistsKind,
    values: &'a [String],
}

#[derive(Deserialize)]
struct ExistsResponse {
    #[serde(default)]
    matched: Vec<String>,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    entries: &'a [ScanEntry],
}

// ── HttpRemote ──────────────────────────────────────────────────────

/// RemoteStore over the inventory REST API.
///
/// Routes, relative to `base_url`:
/// - `POST /inbound/exists`: `{kind, values}` → `{matched}`
/// - `POST /inbound/registrations`: `{entries}` → `{accepted, rejectedReason}`
/// - `GET  /inbound/catalog?page=&q=`: `{items, total}`
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl HttpRemote {
    pub fn new(
        base_url: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/inbound/{}", self.base_url, path)
    }

    async fn authed(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, RemoteError> {
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, RemoteError> {
        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Server { status: code, message: body });
        }
        resp.json::<R>()
            .await
            .map_err(|e| RemoteError::Decode(format!("response body: {}", e)))
    }
}

#[async_trait::async_trait]
impl RemoteStore for HttpRemote {
    async fn query_exists(
        &self,
        kind: ExistsKind,
        values: &[String],
    ) -> Result<Vec<String>, RemoteError> {
        let req = self
            .http
            .post(self.url("exists"))
            .json(&ExistsRequest { kind, values });
        let resp = self.authed(req).await?.send().await?;
        let body: ExistsResponse = Self::parse(resp).await?;
        debug!("exists {:?}: {} of {} matched", kind, body.matched.len(), values.len());
        Ok(body.matched)
    }

    async fn submit_chunk(&self, entries: &[ScanEntry]) -> Result<ChunkAck, RemoteError> {
        let req = self
            .http
            .post(self.url("registrations"))
            .json(&SubmitRequest { entries });
        let resp = self.authed(req).await?.send().await?;

        // A non-2xx answer is the server saying no, not a transport failure.
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(ChunkAck::rejected(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        resp.json::<ChunkAck>()
            .await
            .map_err(|e| RemoteError::Decode(format!("submit response: {}", e)))
    }

    async fn list_catalog_items(
        &self,
        page: usize,
        query: &str,
    ) -> Result<CatalogPage, RemoteError> {
        let page = page.max(1).to_string();
        let req = self
            .http
            .get(self.url("catalog"))
            .query(&[("page", page.as_str()), ("q", query)]);
        let resp = self.authed(req).await?.send().await?;
        Self::parse(resp).await
    }
}
