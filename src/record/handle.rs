//! Lock handles for the pessimistic write path.

use std::fmt;
use std::sync::Arc;

use crate::lock::{LeaseId, Lock};

use super::{Record, RecordId, StoreError, Versioned};

/// Proof of holding the exclusive lock on one record.
///
/// The lock is released by `release` or, failing that, when the handle is
/// dropped. Dropping covers early returns, `?` propagation and unwinding, so a
/// handle can never leave its record locked after it goes out of scope.
pub struct LockHandle {
    collection: &'static str,
    id: RecordId,
    lease: LeaseId,
    lock: Arc<dyn Lock>,
    released: bool,
}

impl LockHandle {
    pub(crate) fn new(
        collection: &'static str,
        id: RecordId,
        lease: LeaseId,
        lock: Arc<dyn Lock>,
    ) -> Self {
        Self {
            collection,
            id,
            lease,
            lock,
            released: false,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Whether this handle locks the given record.
    pub fn covers(&self, collection: &str, id: RecordId) -> bool {
        self.collection == collection && self.id == id
    }

    /// Whether the lock is still held through this handle.
    pub fn is_held(&self) -> Result<bool, StoreError> {
        if self.released {
            return Ok(false);
        }
        Ok(self.lock.is_held_by(self.lease)?)
    }

    /// Release the lock. Calling this more than once is a no-op.
    ///
    /// If the backend fails to release, the handle still counts as holding
    /// the lock and the next `release` (or drop) tries again.
    pub fn release(&mut self) -> Result<(), StoreError> {
        if self.released {
            return Ok(());
        }
        self.lock.release(self.lease)?;
        self.released = true;
        tracing::debug!(collection = self.collection, id = self.id, "record lock released");
        Ok(())
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!(
                collection = self.collection,
                id = self.id,
                error = %e,
                "failed to release record lock on drop"
            );
        }
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("collection", &self.collection)
            .field("id", &self.id)
            .field("lease", &self.lease)
            .field("released", &self.released)
            .finish()
    }
}

/// A record read under its exclusive lock.
#[derive(Debug)]
pub struct Locked<R: Record> {
    pub record: Versioned<R>,
    pub handle: LockHandle,
}

impl<R: Record> Locked<R> {
    pub fn record(&self) -> &Versioned<R> {
        &self.record
    }

    pub fn handle(&self) -> &LockHandle {
        &self.handle
    }

    /// Release the lock early and keep the record snapshot.
    pub fn release(mut self) -> Result<Versioned<R>, StoreError> {
        self.handle.release()?;
        Ok(self.record)
    }
}
