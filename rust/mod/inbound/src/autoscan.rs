//! Auto-scan: turn a stream of raw scanner readings into settled serials.
//!
//! A reading is emitted once no newer reading arrived for the debounce
//! window. A blank reading cancels whatever was pending. A settled value
//! equal (case-insensitively) to the previous one is dropped, so a scanner
//! that repeats itself does not re-trigger admission.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::model::fold_key;

/// Spawn the debounce stage. The returned receiver closes after `input`
/// closes and any pending reading has been flushed.
pub fn spawn(mut input: mpsc::Receiver<String>, window: Duration) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut pending: Option<String> = None;
        let mut last: Option<String> = None;

        loop {
            let next = match pending.take() {
                None => input.recv().await,
                Some(value) => {
                    tokio::select! {
                        next = input.recv() => {
                            if next.is_none() {
                                pending = Some(value);
                            }
                            next
                        }
                        _ = tokio::time::sleep(window) => {
                            if !settle(&tx, &mut last, value).await {
                                return;
                            }
                            continue;
                        }
                    }
                }
            };

            let Some(raw) = next else { break };
            let value = raw.trim();
            if value.is_empty() {
                debug!("autoscan: blank reading, pending value dropped");
                continue;
            }
            pending = Some(value.to_string());
        }

        if let Some(value) = pending {
            settle(&tx, &mut last, value).await;
        }
    });

    rx
}

/// Emit `value` unless it repeats the last emitted one. Returns false once
/// the consumer is gone.
async fn settle(tx: &mpsc::Sender<String>, last: &mut Option<String>, value: String) -> bool {
    let key = fold_key(&value);
    if last.as_deref() == Some(key.as_str()) {
        debug!("autoscan: {} repeated, ignored", value);
        return true;
    }
    *last = Some(key);
    tx.send(value).await.is_ok()
}
