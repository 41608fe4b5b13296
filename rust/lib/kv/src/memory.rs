use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::KVError;
use crate::traits::KVStore;

/// MemoryStore keeps slots in process memory. Nothing survives a restart,
/// which makes it the store of choice in pipeline tests.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let slots = self.slots.read().map_err(|_| KVError::Poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut slots = self.slots.write().map_err(|_| KVError::Poisoned)?;
        slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut slots = self.slots.write().map_err(|_| KVError::Poisoned)?;
        slots.remove(key);
        Ok(())
    }
}
