//! Continuous scanning from stdin.
//!
//! A keyboard-wedge scanner types the barcode followed by Enter, so each
//! stdin line is one reading. With `--auto`, lines are instead treated as
//! successive values of a single input field and only settled values are
//! staged.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use scanstage_inbound::{autoscan, ScanCandidate};

use super::{open_service, require_server, resolve_item};
use crate::config::ClientConfig;

pub async fn run(
    config: &ClientConfig,
    item_id: &str,
    invoice: &str,
    quantity: Option<u32>,
    auto: bool,
    json: bool,
) -> Result<()> {
    require_server(config)?;
    let mut service = open_service(config)?;
    let item = resolve_item(&service, item_id).await?;

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
        debug!("stdin closed");
    });
    let mut readings = if auto {
        autoscan::spawn(rx, config.pipeline.debounce())
    } else {
        rx
    };

    eprintln!(
        "Scanning {} ({}) on invoice {}. End input (Ctrl-D) to finish.",
        item.item_name, item.sku, invoice
    );

    let mut added = 0usize;
    let mut refused = 0usize;
    while let Some(serial) = readings.recv().await {
        if serial.trim().is_empty() {
            continue;
        }
        let candidate = ScanCandidate {
            item: item.clone(),
            invoice_number: invoice.to_string(),
            serial_number: serial.clone(),
            quantity,
        };
        match service.add_entry(candidate).await {
            Ok(entry) => {
                added += 1;
                if json {
                    println!("{}", serde_json::to_string(&entry)?);
                } else {
                    println!("+ {}", entry.serial_number);
                }
            }
            Err(e) => {
                refused += 1;
                eprintln!("! {}: {}", serial.trim(), e);
            }
        }
    }

    eprintln!(
        "{} staged, {} refused; batch now {} entries",
        added,
        refused,
        service.entries().len()
    );
    Ok(())
}
