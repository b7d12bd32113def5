use std::sync::Arc;

use super::{Lock, LockError};

/// Factory trait for obtaining per-record locks.
///
/// `InMemoryRecordStore` asks its `LockManager` for the lock of a
/// `"collection:id"` key on every `locking_get`.
pub trait LockManager: Send + Sync {
    /// The concrete lock type returned by this manager.
    type Lock: Lock + 'static;

    /// Get (or create) the lock for the given key.
    ///
    /// Repeated calls with the same `key` must return the same logical lock
    /// (i.e. the same `Arc` for in-memory, or the same distributed key).
    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;
}
