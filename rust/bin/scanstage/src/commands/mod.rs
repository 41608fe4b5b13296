pub mod catalog;
pub mod commit;
pub mod scan;
pub mod staging;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use scanstage_inbound::{
    CatalogItem, HttpRemote, InboundService, NoAuth, StaticToken, TokenSource,
};
use scanstage_kv::RedbStore;

use crate::config::ClientConfig;

/// Update connection properties, keeping whatever is not given.
pub fn configure(
    path: &Path,
    server: Option<&str>,
    token: Option<&str>,
    db: Option<&str>,
) -> Result<()> {
    let mut config = ClientConfig::load(path)?;
    if let Some(server) = server {
        config.server = server.trim_end_matches('/').to_string();
    }
    if let Some(token) = token {
        config.token = token.to_string();
    }
    if let Some(db) = db {
        config.db_path = Some(db.to_string());
    }
    config.save(path)?;
    println!("Config written to {}", path.display());
    Ok(())
}

/// Open the staging pipeline over the local database and the configured
/// server. Commands that only touch the local batch never hit the server.
pub fn open_service(config: &ClientConfig) -> Result<InboundService> {
    let kv = Arc::new(RedbStore::open(&config.db_path())?);

    let token_source: Arc<dyn TokenSource> = if config.token.is_empty() {
        Arc::new(NoAuth)
    } else {
        Arc::new(StaticToken::new(config.token.clone()))
    };
    let remote = HttpRemote::new(
        config.server.clone(),
        token_source,
        config.pipeline.remote_timeout(),
    )?;

    let service = InboundService::open(kv, Arc::new(remote), config.pipeline.clone())?;
    if service.persistence_degraded() {
        eprintln!("warning: staging database is not writable; changes may be lost");
    }
    Ok(service)
}

/// Fail early, with a hint, when no server is configured.
pub fn require_server(config: &ClientConfig) -> Result<()> {
    if config.server.is_empty() {
        anyhow::bail!("No server URL set. Run `scanstage configure --server <url>`.");
    }
    Ok(())
}

/// Look up a catalog item by id.
pub async fn resolve_item(service: &InboundService, item_id: &str) -> Result<CatalogItem> {
    service
        .resolve_item(item_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Unknown item: {}", item_id))
}

/// Ask on stderr, read the answer from stdin.
pub fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    std::io::stderr().flush()?;
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().eq_ignore_ascii_case("y"))
}
