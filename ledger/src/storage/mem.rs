//! In-memory key-value store.
//!
//! This implementation is useful for unit tests, benchmarks, and small
//! demo runs. The map is shared behind an `Arc`, so cloning the store
//! yields a handle onto the same data; tests use this to simulate a
//! process restart by reloading a chain from a clone.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{KvStore, StorageError};

/// In-memory implementation of [`KvStore`].
#[derive(Clone, Default)]
pub struct InMemoryKvStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryKvStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("kv map lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes `key`, if present. Used by tests to simulate a crash that
    /// lost part of a multi-key write.
    pub fn remove(&mut self, key: &str) {
        self.entries
            .lock()
            .expect("kv map lock poisoned")
            .remove(key);
    }
}

impl KvStore for InMemoryKvStore {
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries
            .lock()
            .expect("kv map lock poisoned")
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .entries
            .lock()
            .expect("kv map lock poisoned")
            .get(key)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_roundtrip() {
        let mut store = InMemoryKvStore::new();
        store.put("block_0", b"genesis").expect("put");

        let fetched = store.get("block_0").expect("get");
        assert_eq!(fetched.as_deref(), Some(&b"genesis"[..]));
        assert!(store.get("block_1").expect("get").is_none());
    }

    #[test]
    fn clones_share_the_same_map() {
        let mut store = InMemoryKvStore::new();
        let reopened = store.clone();

        store.put("latest_block_index", b"3").expect("put");
        let fetched = reopened.get("latest_block_index").expect("get");
        assert_eq!(fetched.as_deref(), Some(&b"3"[..]));
    }
}
