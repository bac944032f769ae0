//! Key-value storage backends for the chain.
//!
//! The chain store persists blocks through the small [`KvStore`] trait
//! with string keys: `block_<index>` for block bodies and
//! `latest_block_index` for the tip pointer. Two backends are provided:
//!
//! - an in-memory store ([`mem::InMemoryKvStore`]) suitable for tests,
//! - a RocksDB-backed store ([`rocksdb::RocksDbKvStore`]) for durable
//!   single-authority nodes.

use std::fmt;

pub mod mem;
pub mod rocksdb;

pub use mem::InMemoryKvStore;
pub use rocksdb::{RocksDbConfig, RocksDbKvStore};

/// Abstract key-value interface used by the chain store.
///
/// Implementations must make `put` durable before returning: a block is
/// only considered appended once its write has been acknowledged.
pub trait KvStore {
    /// Durably writes `value` under `key`, overwriting any previous value.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Fetches the value stored under `key`, if present.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Storage-level error type.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying RocksDB error.
    RocksDb(::rocksdb::Error),
    /// Failure reported by a non-RocksDB backend.
    Backend(String),
}

impl From<::rocksdb::Error> for StorageError {
    fn from(e: ::rocksdb::Error) -> Self {
        StorageError::RocksDb(e)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::RocksDb(e) => write!(f, "rocksdb error: {e}"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Key under which the block at `index` is stored.
pub fn block_key(index: u64) -> String {
    format!("block_{index}")
}

/// Key under which the latest block index pointer is stored.
pub const LATEST_INDEX_KEY: &str = "latest_block_index";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store_trait_is_object_safe() {
        fn use_trait_object(store: &mut dyn KvStore) {
            let _ = store.get("block_0");
        }

        let mut store = InMemoryKvStore::new();
        use_trait_object(&mut store);
    }

    #[test]
    fn block_keys_are_index_scoped() {
        assert_eq!(block_key(0), "block_0");
        assert_eq!(block_key(42), "block_42");
    }
}
