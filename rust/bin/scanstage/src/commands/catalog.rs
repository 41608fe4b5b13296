use anyhow::Result;

use super::{open_service, require_server};
use crate::config::ClientConfig;

/// Print one page of catalog items matching `query`.
pub async fn list(config: &ClientConfig, query: &str, page: usize, json: bool) -> Result<()> {
    require_server(config)?;
    let service = open_service(config)?;
    let result = service.catalog(page.max(1), query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if result.items.is_empty() {
        println!("No items.");
        return Ok(());
    }
    println!("{:<20} {:<14} NAME", "ID", "SKU");
    for item in &result.items {
        println!("{:<20} {:<14} {}", item.item_id, item.sku, item.item_name);
    }
    println!("\npage {}, {} items total", page.max(1), result.total);
    Ok(())
}
