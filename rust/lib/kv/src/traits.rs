use crate::error::KVError;

/// KVStore is the durable slot interface used by local session state.
///
/// Keys are namespaced strings such as `inbound:staging`. Every `set`
/// replaces the whole value for that key; there are no partial updates.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Store a value, replacing any previous value under the same key.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;
}
