//! Scripted in-memory RemoteStore for pipeline tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::model::{fold_key, CatalogItem, CatalogPage, ScanEntry};
use super::{ChunkAck, ExistsKind, RemoteError, RemoteStore};

#[derive(Default)]
pub(crate) struct FakeRemote {
    invoices: Mutex<HashSet<String>>,
    serials: Mutex<HashSet<String>>,
    catalog: Vec<CatalogItem>,
    /// Serial numbers of each submitted chunk, in submission order.
    submissions: Mutex<Vec<Vec<String>>>,
    exists_calls: Mutex<Vec<(ExistsKind, Vec<String>)>>,
    /// Zero-based submission index to reject.
    reject_at: Mutex<Option<usize>>,
    /// Zero-based submission index to fail in transit.
    drop_at: Mutex<Option<usize>>,
    unreachable: AtomicBool,
    stalled: AtomicBool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(items: Vec<CatalogItem>) -> Self {
        Self {
            catalog: items,
            ..Self::default()
        }
    }

    pub fn register_invoice(&self, invoice: &str) {
        self.invoices.lock().unwrap().insert(fold_key(invoice));
    }

    pub fn register_serial(&self, serial: &str) {
        self.serials.lock().unwrap().insert(fold_key(serial));
    }

    pub fn reject_submission(&self, index: usize) {
        *self.reject_at.lock().unwrap() = Some(index);
    }

    pub fn drop_submission(&self, index: usize) {
        *self.drop_at.lock().unwrap() = Some(index);
    }

    pub fn heal(&self) {
        *self.reject_at.lock().unwrap() = None;
        *self.drop_at.lock().unwrap() = None;
        self.unreachable.store(false, Ordering::SeqCst);
        self.stalled.store(false, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, down: bool) {
        self.unreachable.store(down, Ordering::SeqCst);
    }

    /// Every call hangs until the caller gives up.
    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Vec<String>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn exists_calls(&self) -> Vec<(ExistsKind, Vec<String>)> {
        self.exists_calls.lock().unwrap().clone()
    }

    async fn gate(&self) -> Result<(), RemoteError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Server {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for FakeRemote {
    async fn query_exists(
        &self,
        kind: ExistsKind,
        values: &[String],
    ) -> Result<Vec<String>, RemoteError> {
        self.gate().await?;
        self.exists_calls
            .lock()
            .unwrap()
            .push((kind, values.to_vec()));
        let known = match kind {
            ExistsKind::Invoice => self.invoices.lock().unwrap().clone(),
            ExistsKind::Serial => self.serials.lock().unwrap().clone(),
        };
        Ok(values
            .iter()
            .filter(|v| known.contains(&fold_key(v)))
            .cloned()
            .collect())
    }

    async fn submit_chunk(&self, entries: &[ScanEntry]) -> Result<ChunkAck, RemoteError> {
        self.gate().await?;
        let index = {
            let mut subs = self.submissions.lock().unwrap();
            subs.push(entries.iter().map(|e| e.serial_number.clone()).collect());
            subs.len() - 1
        };
        if *self.drop_at.lock().unwrap() == Some(index) {
            return Err(RemoteError::Server {
                status: 502,
                message: "connection reset".into(),
            });
        }
        if *self.reject_at.lock().unwrap() == Some(index) {
            return Ok(ChunkAck::rejected("duplicate serial in chunk"));
        }
        for entry in entries {
            self.register_invoice(&entry.invoice_number);
            self.register_serial(&entry.serial_number);
        }
        Ok(ChunkAck::accepted())
    }

    async fn list_catalog_items(
        &self,
        page: usize,
        query: &str,
    ) -> Result<CatalogPage, RemoteError> {
        self.gate().await?;
        let q = fold_key(query);
        let matched: Vec<CatalogItem> = self
            .catalog
            .iter()
            .filter(|i| {
                q.is_empty()
                    || fold_key(&i.item_id).contains(&q)
                    || fold_key(&i.sku).contains(&q)
                    || fold_key(&i.item_name).contains(&q)
            })
            .cloned()
            .collect();
        let total = matched.len();
        let items = matched.into_iter().skip((page.max(1) - 1) * 20).take(20).collect();
        Ok(CatalogPage { items, total })
    }
}
