use std::sync::Arc;

use tracing::{info, warn};

use scanstage_kv::KVStore;

use crate::committer::{BatchCommitter, FailureKind};
use crate::config::{ConfigError, PipelineConfig};
use crate::detector::DuplicateDetector;
use crate::error::{AdmissionError, CommitError, NotStaged};
use crate::import::{rows_to_entries, ImportRow};
use crate::mirror::PersistenceMirror;
use crate::model::{CatalogItem, CatalogPage, CommitReport, ScanCandidate, ScanEntry, Summary};
use crate::remote::{bounded, RemoteError, RemoteStore};
use crate::staging::StagingStore;
use crate::summary;

/// InboundService: the operator-facing staging workflow.
///
/// Holds the staging store plus the remote-facing detector and committer.
/// Every mutating operation takes `&mut self`, so no two operations can
/// interleave, a commit included: while `commit` is awaiting the remote
/// store, nothing else can touch the batch.
pub struct InboundService {
    store: StagingStore,
    detector: DuplicateDetector,
    committer: BatchCommitter,
    remote: Arc<dyn RemoteStore>,
    config: PipelineConfig,
}

impl InboundService {
    /// Build the service and adopt whatever batch the mirror holds.
    pub fn open(
        kv: Arc<dyn KVStore>,
        remote: Arc<dyn RemoteStore>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mirror = PersistenceMirror::new(kv, config.slot.clone());
        let mut store = StagingStore::new(mirror, config.max_batch);
        store.load();

        Ok(Self {
            store,
            detector: DuplicateDetector::new(remote.clone(), config.remote_timeout()),
            committer: BatchCommitter::new(remote.clone(), config.chunk_size, config.remote_timeout()),
            remote,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Staged entries, in scan order.
    pub fn entries(&self) -> &[ScanEntry] {
        self.store.snapshot()
    }

    /// True when the local mirror could not be written on the last change.
    pub fn persistence_degraded(&self) -> bool {
        self.store.persistence_degraded()
    }

    // ── Admission ──

    /// Validate, check for duplicates (locally, then remotely) and stage.
    pub async fn add_entry(&mut self, candidate: ScanCandidate) -> Result<ScanEntry, AdmissionError> {
        let entry = candidate.into_entry()?;

        // Local checks first: no point asking the remote about a serial
        // that cannot be staged anyway.
        self.store.check_admissible(&entry.serial_number)?;

        let check = self
            .detector
            .check_single(&entry.invoice_number, &entry.serial_number)
            .await
            .map_err(AdmissionError::DetectionUnavailable)?;

        let invoice_conflict = check.invoice_exists && !self.store.is_resumed(&entry.invoice_number);
        match (invoice_conflict, check.serial_exists) {
            (true, true) => {
                return Err(AdmissionError::InvoiceAndSerialExist {
                    invoice: entry.invoice_number,
                    serial: entry.serial_number,
                });
            }
            (false, true) => return Err(AdmissionError::SerialAlreadyExists(entry.serial_number)),
            (true, false) => return Err(AdmissionError::InvoiceAlreadyExists(entry.invoice_number)),
            (false, false) => {}
        }

        self.store.append(entry.clone())?;
        Ok(entry)
    }

    /// Replace the batch with imported rows. Returns the staged count.
    pub fn import_rows(&mut self, rows: Vec<ImportRow>) -> Result<usize, AdmissionError> {
        let entries = rows_to_entries(rows)?;
        let count = entries.len();
        self.store.replace_all(entries)?;
        info!("imported {} entries into staging", count);
        Ok(count)
    }

    // ── Editing ──

    pub fn undo_last(&mut self) -> Option<ScanEntry> {
        self.store.remove_last()
    }

    pub fn delete_entry(&mut self, serial: &str) -> Result<ScanEntry, NotStaged> {
        self.store.remove_by_serial(serial)
    }

    pub fn clear_all(&mut self) {
        self.store.clear();
        info!("staging batch cleared");
    }

    // ── Views ──

    /// Current grouping by invoice and item. Recomputed on every call.
    pub fn summary(&self) -> Summary {
        summary::project(self.store.snapshot())
    }

    /// Browse master items for entry construction.
    pub async fn catalog(&self, page: usize, query: &str) -> Result<CatalogPage, RemoteError> {
        bounded(
            self.config.remote_timeout(),
            self.remote.list_catalog_items(page, query),
        )
        .await
    }

    /// Find a catalog item by exact id (case-insensitive), if listed.
    ///
    /// The catalog search is fuzzy, so the exact id may sit on any page of
    /// the results. Pages are walked until the id turns up, a page comes
    /// back empty or `total` items have been seen.
    pub async fn resolve_item(&self, item_id: &str) -> Result<Option<CatalogItem>, RemoteError> {
        let wanted = item_id.trim();
        let mut seen = 0usize;
        for page_no in 1.. {
            let page = self.catalog(page_no, wanted).await?;
            if page.items.is_empty() {
                break;
            }
            seen += page.items.len();
            if let Some(item) = page
                .items
                .into_iter()
                .find(|i| i.item_id.trim().eq_ignore_ascii_case(wanted))
            {
                return Ok(Some(item));
            }
            if seen >= page.total {
                break;
            }
        }
        Ok(None)
    }

    // ── Commit ──

    /// Re-check the whole batch against the remote store, then submit it in
    /// chunks. On full success the batch is cleared. On a stop part-way,
    /// acknowledged entries are dropped and the rest stays staged.
    pub async fn commit(&mut self) -> Result<CommitReport, CommitError> {
        let entries = self.store.snapshot();
        if entries.is_empty() {
            return Ok(CommitReport::default());
        }

        let invoices: Vec<String> = entries.iter().map(|e| e.invoice_number.clone()).collect();
        let serials: Vec<String> = entries.iter().map(|e| e.serial_number.clone()).collect();
        let mut check = self
            .detector
            .check_batch(&invoices, &serials)
            .await
            .map_err(CommitError::DetectionUnavailable)?;

        // Invoices this batch already started registering are expected remotely.
        let store = &self.store;
        check.existing_invoices.retain(|inv| !store.is_resumed(inv));
        if !check.is_clean() {
            return Err(CommitError::ValidationFailed(check));
        }

        let outcome = self.committer.commit(self.store.snapshot()).await;
        let report = outcome.report;

        let Some(failure) = outcome.failure else {
            self.store.clear();
            info!("batch committed: {}", report);
            return Ok(report);
        };

        self.store.discard_committed(report.entries_committed);
        warn!(
            "commit stopped at chunk {}: {} (batch now {} entries)",
            failure.chunk_index,
            report,
            self.store.len()
        );
        Err(match failure.kind {
            FailureKind::Rejected(reason) => CommitError::PartialFailure {
                report,
                chunk: failure.chunk_index,
                reason,
            },
            FailureKind::Transport(source) => CommitError::TransportError {
                report,
                chunk: failure.chunk_index,
                source,
            },
        })
    }
}
