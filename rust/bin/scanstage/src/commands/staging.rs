//! Local batch commands: add, undo, delete, clear, list, summary, import.

use anyhow::Result;

use scanstage_inbound::import::parse_rows;
use scanstage_inbound::{ScanCandidate, ScanEntry, Summary};

use super::{confirm, open_service, require_server, resolve_item};
use crate::config::ClientConfig;

pub async fn add(
    config: &ClientConfig,
    item_id: &str,
    invoice: &str,
    serial: &str,
    quantity: Option<u32>,
    json: bool,
) -> Result<()> {
    require_server(config)?;
    let mut service = open_service(config)?;
    let item = resolve_item(&service, item_id).await?;

    let entry = service
        .add_entry(ScanCandidate {
            item,
            invoice_number: invoice.to_string(),
            serial_number: serial.to_string(),
            quantity,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!(
            "Staged {} ({} entries in batch)",
            entry.serial_number,
            service.entries().len()
        );
    }
    Ok(())
}

pub fn undo(config: &ClientConfig) -> Result<()> {
    let mut service = open_service(config)?;
    match service.undo_last() {
        Some(entry) => println!("Removed {}", entry.serial_number),
        None => println!("Batch is empty."),
    }
    Ok(())
}

pub fn delete(config: &ClientConfig, serial: &str) -> Result<()> {
    let mut service = open_service(config)?;
    let entry = service.delete_entry(serial)?;
    println!("Removed {}", entry.serial_number);
    Ok(())
}

pub fn clear(config: &ClientConfig, yes: bool) -> Result<()> {
    let mut service = open_service(config)?;
    let count = service.entries().len();
    if count == 0 {
        println!("Batch is empty.");
        return Ok(());
    }
    if !yes && !confirm(&format!("Discard {} staged entries?", count))? {
        println!("Cancelled.");
        return Ok(());
    }
    service.clear_all();
    println!("Cleared {} entries.", count);
    Ok(())
}

pub fn list(config: &ClientConfig, json: bool) -> Result<()> {
    let service = open_service(config)?;
    let entries = service.entries();
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("Batch is empty.");
        return Ok(());
    }
    print_entries(entries);
    println!("\n{} entries", entries.len());
    Ok(())
}

pub fn summary(config: &ClientConfig, json: bool) -> Result<()> {
    let service = open_service(config)?;
    let summary = service.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Replace the batch with the rows of a JSON file.
pub fn import(config: &ClientConfig, file: &str, yes: bool) -> Result<()> {
    let data = std::fs::read(file)?;
    let rows = parse_rows(&data)?;

    let mut service = open_service(config)?;
    let staged = service.entries().len();
    if staged > 0
        && !yes
        && !confirm(&format!("Replace {} staged entries with {} rows?", staged, rows.len()))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let count = service.import_rows(rows)?;
    println!("Imported {} entries. Duplicates are checked at commit.", count);
    Ok(())
}

fn print_entries(entries: &[ScanEntry]) {
    println!(
        "{:<24} {:<16} {:<14} {:>5}  NAME",
        "SERIAL", "INVOICE", "SKU", "QTY"
    );
    for e in entries {
        println!(
            "{:<24} {:<16} {:<14} {:>5}  {}",
            e.serial_number, e.invoice_number, e.sku, e.quantity, e.item_name
        );
    }
}

fn print_summary(summary: &Summary) {
    if summary.invoices.is_empty() {
        println!("Batch is empty.");
        return;
    }
    for invoice in &summary.invoices {
        println!(
            "{}  ({} entries, qty {})",
            invoice.invoice_number, invoice.entries, invoice.quantity
        );
        for item in &invoice.items {
            println!("    {:<14} {:<28} {:>6}", item.sku, item.item_name, item.quantity);
        }
    }
    println!(
        "\nTotal: {} entries, qty {}",
        summary.total_entries, summary.grand_total
    );
}
