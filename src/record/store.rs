//! RecordStore - the storage contract both concurrency controllers build on.

use std::time::Duration;

use crate::lock::CancelToken;

use super::{LockHandle, Locked, Record, RecordId, StoreError, Versioned};

/// Key-addressed storage of versioned records.
///
/// Implementations must make `conditional_write` a single atomic
/// compare-and-swap per record, and must serialize `locking_get` callers on
/// the same record. Mixing `conditional_write` with `write` on a record that
/// is currently locked is not supported: every writer of a pessimistically
/// controlled record must go through the lock path.
pub trait RecordStore: Send + Sync {
    /// Read the current state of a record.
    fn get<R: Record>(&self, id: RecordId) -> Result<Versioned<R>, StoreError>;

    /// All records of a collection, ordered by id.
    fn list<R: Record>(&self) -> Result<Vec<Versioned<R>>, StoreError>;

    /// Number of records in a collection.
    fn count<R: Record>(&self) -> Result<usize, StoreError>;

    /// Create a record. The store assigns its id; the initial version is 1.
    fn insert<R: Record>(&self, data: &R) -> Result<Versioned<R>, StoreError>;

    /// Persist `data` only if the stored version still equals
    /// `expected_version`. On success the version is incremented by one; on
    /// `VersionConflict` nothing is written. Never blocks on record locks.
    fn conditional_write<R: Record>(
        &self,
        id: RecordId,
        data: &R,
        expected_version: u64,
    ) -> Result<Versioned<R>, StoreError>;

    /// Take the exclusive lock on a record and read it.
    ///
    /// Blocks while another handle holds the lock, up to `timeout`, or until
    /// `cancel` fires. The lock is held until the returned handle is released
    /// or dropped.
    fn locking_get<R: Record>(
        &self,
        id: RecordId,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Locked<R>, StoreError>;

    /// Persist `data` under a held lock, without a version check.
    fn write<R: Record>(&self, handle: &LockHandle, data: &R) -> Result<Versioned<R>, StoreError>;

    /// Release a lock handle. Idempotent.
    fn release(&self, handle: &mut LockHandle) -> Result<(), StoreError> {
        handle.release()
    }
}
