use std::sync::Arc;

use scanstage_kv::KVStore;

use crate::error::PersistenceError;
use crate::model::ScanEntry;

/// PersistenceMirror: the staged batch, serialized as a JSON array under
/// one KV slot. Writes replace the whole slot.
///
/// A companion slot (`{slot}:resumed`) holds the invoice numbers whose
/// earlier chunks were acknowledged by a commit that later stopped.
pub struct PersistenceMirror {
    kv: Arc<dyn KVStore>,
    slot: String,
    resumed_slot: String,
}

impl PersistenceMirror {
    pub fn new(kv: Arc<dyn KVStore>, slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self {
            kv,
            resumed_slot: format!("{}:resumed", slot),
            slot,
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn save(&self, entries: &[ScanEntry]) -> Result<(), PersistenceError> {
        let data = serde_json::to_vec(entries)?;
        self.kv.set(&self.slot, &data)?;
        Ok(())
    }

    /// Read the slot. `Ok(None)` when nothing has been saved.
    pub fn load(&self) -> Result<Option<Vec<ScanEntry>>, PersistenceError> {
        match self.kv.get(&self.slot)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    pub fn save_resumed(&self, invoice_keys: &[String]) -> Result<(), PersistenceError> {
        if invoice_keys.is_empty() {
            self.kv.delete(&self.resumed_slot)?;
            return Ok(());
        }
        let data = serde_json::to_vec(invoice_keys)?;
        self.kv.set(&self.resumed_slot, &data)?;
        Ok(())
    }

    pub fn load_resumed(&self) -> Result<Vec<String>, PersistenceError> {
        match self.kv.get(&self.resumed_slot)? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// Erase both slots.
    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.kv.delete(&self.slot)?;
        self.kv.delete(&self.resumed_slot)?;
        Ok(())
    }
}
