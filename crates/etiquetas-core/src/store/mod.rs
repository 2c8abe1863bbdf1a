//! Persistent key-value storage capability.
//!
//! The cache layer is written against the [`Store`] trait rather than a
//! hardwired backend, so the disk store can be swapped for an in-memory
//! fake in tests. Keys are flat strings, already namespaced by the cache
//! layer (source name plus branch id); values are JSON documents.

pub mod disk;
pub mod memory;

use std::sync::Arc;

use thiserror::Error;

pub use disk::DiskStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write key {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A persistent string-to-string store.
///
/// Reads never fail loudly: any problem reading a key is a miss. Writes
/// report failure so the caller can log it, but a failed write must never
/// corrupt values stored under other keys.
pub trait Store: Send + Sync {
    /// Raw value for a key, or `None` on a miss or any read problem.
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Best-effort removal of one key.
    fn remove(&self, key: &str);

    /// Remove every key this store created. The next visit reloads
    /// everything from the network.
    fn clear(&self);
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn clear(&self) {
        (**self).clear()
    }
}
