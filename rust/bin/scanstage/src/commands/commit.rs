use anyhow::Result;

use scanstage_inbound::CommitError;

use super::{open_service, require_server};
use crate::config::ClientConfig;

pub async fn run(config: &ClientConfig, json: bool) -> Result<()> {
    require_server(config)?;
    let mut service = open_service(config)?;
    let total = service.entries().len();
    if total == 0 {
        println!("Nothing to commit.");
        return Ok(());
    }
    eprintln!(
        "Committing {} entries in chunks of {}...",
        total,
        service.config().chunk_size
    );

    match service.commit().await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Committed: {}", report);
            }
            Ok(())
        }
        Err(CommitError::ValidationFailed(check)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            }
            anyhow::bail!("Commit blocked, nothing was sent. {}", check);
        }
        Err(e) => {
            if let Some(report) = e.report().filter(|_| json) {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            anyhow::bail!(
                "{}. {} entries remain staged; run `scanstage commit` again to retry.",
                e,
                service.entries().len()
            );
        }
    }
}
