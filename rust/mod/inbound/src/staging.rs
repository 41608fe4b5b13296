use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info, warn};

use crate::error::{NotStaged, StagingError};
use crate::mirror::PersistenceMirror;
use crate::model::{fold_key, ScanEntry};

/// StagingStore: the authoritative, ordered set of pending scans.
///
/// Every mutation rewrites the mirror before returning, so a restart right
/// after a mutation sees exactly the post-mutation batch. A failed mirror
/// write is logged and flagged via [`persistence_degraded`], but the
/// in-memory batch stays authoritative.
///
/// [`persistence_degraded`]: StagingStore::persistence_degraded
pub struct StagingStore {
    entries: Vec<ScanEntry>,
    /// Occurrence count per folded serial. Counts above one only happen
    /// when a restored or imported batch already carried duplicates.
    serials: HashMap<String, usize>,
    /// Folded invoice numbers with acknowledged chunks from a commit that
    /// stopped early. Their remote existence is our own doing.
    resumed: BTreeSet<String>,
    mirror: PersistenceMirror,
    capacity: usize,
    degraded: bool,
}

impl StagingStore {
    /// Create an empty store. Call [`load`](Self::load) to adopt the mirror.
    pub fn new(mirror: PersistenceMirror, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            serials: HashMap::new(),
            resumed: BTreeSet::new(),
            mirror,
            capacity,
            degraded: false,
        }
    }

    /// Replace the in-memory batch with the mirror's content.
    ///
    /// An absent slot yields an empty batch. A malformed slot is discarded
    /// (and erased) rather than treated as fatal. Returns the entry count.
    pub fn load(&mut self) -> usize {
        let entries = match self.mirror.load() {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("discarding unreadable staging mirror {}: {}", self.mirror.slot(), e);
                if let Err(e) = self.mirror.clear() {
                    warn!("failed to erase staging mirror: {}", e);
                }
                Vec::new()
            }
        };
        self.adopt(entries);
        self.resumed = match self.mirror.load_resumed() {
            Ok(keys) => keys.into_iter().collect(),
            Err(e) => {
                warn!("discarding unreadable resumed-invoice slot: {}", e);
                BTreeSet::new()
            }
        };
        info!(
            "staging batch loaded: {} entries, {} resumed invoices",
            self.entries.len(),
            self.resumed.len()
        );
        self.entries.len()
    }

    /// Fails if `serial` could not be appended right now. A duplicate is
    /// reported with the spelling of the entry already staged.
    pub fn check_admissible(&self, serial: &str) -> Result<(), StagingError> {
        if self.entries.len() >= self.capacity {
            return Err(StagingError::BatchFull(self.capacity));
        }
        let key = fold_key(serial);
        if self.serials.contains_key(&key) {
            let staged = self
                .entries
                .iter()
                .find(|e| e.serial_key() == key)
                .map_or_else(|| serial.trim().to_string(), |e| e.serial_number.clone());
            return Err(StagingError::DuplicateSerial(staged));
        }
        Ok(())
    }

    /// Append an entry at the end of the batch.
    pub fn append(&mut self, entry: ScanEntry) -> Result<(), StagingError> {
        self.check_admissible(&entry.serial_number)?;
        *self.serials.entry(entry.serial_key()).or_insert(0) += 1;
        debug!("staged {} on {}", entry.serial_number, entry.invoice_number);
        self.entries.push(entry);
        self.persist();
        Ok(())
    }

    /// Remove the entry with the given serial (case-insensitive).
    pub fn remove_by_serial(&mut self, serial: &str) -> Result<ScanEntry, NotStaged> {
        let key = fold_key(serial);
        let pos = self
            .entries
            .iter()
            .position(|e| e.serial_key() == key)
            .ok_or_else(|| NotStaged(serial.trim().to_string()))?;
        let removed = self.entries.remove(pos);
        self.forget(&removed);
        self.persist();
        Ok(removed)
    }

    /// Undo: drop the most recently appended entry. No-op on an empty batch.
    pub fn remove_last(&mut self) -> Option<ScanEntry> {
        let removed = self.entries.pop()?;
        self.forget(&removed);
        self.persist();
        Some(removed)
    }

    /// Empty the batch and erase the mirror slot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.serials.clear();
        self.resumed.clear();
        match self.mirror.clear() {
            Ok(()) => self.degraded = false,
            Err(e) => {
                warn!("failed to erase staging mirror: {}", e);
                self.degraded = true;
            }
        }
    }

    /// Replace the batch wholesale (bulk import). The new batch is taken
    /// as-is, duplicates included; commit-time checks report those.
    pub fn replace_all(&mut self, entries: Vec<ScanEntry>) -> Result<(), StagingError> {
        if entries.len() > self.capacity {
            return Err(StagingError::BatchFull(self.capacity));
        }
        self.adopt(entries);
        self.resumed.clear();
        self.persist();
        self.persist_resumed();
        Ok(())
    }

    /// Drop the first `count` entries after their chunks were acknowledged.
    pub fn discard_committed(&mut self, count: usize) {
        let count = count.min(self.entries.len());
        if count == 0 {
            return;
        }
        let committed: Vec<ScanEntry> = self.entries.drain(..count).collect();
        for entry in &committed {
            self.forget(entry);
        }
        let pending: BTreeSet<String> = self.entries.iter().map(|e| e.invoice_key()).collect();
        for entry in &committed {
            let key = entry.invoice_key();
            if pending.contains(&key) {
                self.resumed.insert(key);
            }
        }
        self.persist();
        self.persist_resumed();
    }

    /// True if an earlier, interrupted commit of this batch already
    /// registered part of `invoice`.
    pub fn is_resumed(&self, invoice: &str) -> bool {
        self.resumed.contains(&fold_key(invoice))
    }

    /// The current batch, in insertion order.
    pub fn snapshot(&self) -> &[ScanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the last mirror write failed.
    pub fn persistence_degraded(&self) -> bool {
        self.degraded
    }

    fn persist_resumed(&mut self) {
        let keys: Vec<String> = self.resumed.iter().cloned().collect();
        if let Err(e) = self.mirror.save_resumed(&keys) {
            warn!("failed to mirror resumed invoices: {}", e);
            self.degraded = true;
        }
    }

    fn adopt(&mut self, entries: Vec<ScanEntry>) {
        self.serials.clear();
        for entry in &entries {
            *self.serials.entry(entry.serial_key()).or_insert(0) += 1;
        }
        self.entries = entries;
    }

    fn forget(&mut self, entry: &ScanEntry) {
        let key = entry.serial_key();
        if let Some(n) = self.serials.get_mut(&key) {
            *n -= 1;
            if *n == 0 {
                self.serials.remove(&key);
            }
        }
    }

    fn persist(&mut self) {
        match self.mirror.save(&self.entries) {
            Ok(()) => self.degraded = false,
            Err(e) => {
                warn!("failed to mirror staging batch ({} entries): {}", self.entries.len(), e);
                self.degraded = true;
            }
        }
    }
}
