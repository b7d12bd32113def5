//! Pessimistic concurrency control: prevent conflicting writers by locking.
//!
//! A transaction takes the record's exclusive lock before reading it and
//! holds it through the write. A second transaction on the same record waits
//! in `locking_get` until the first releases (or its timeout elapses), so it
//! always observes the first one's result.

use std::sync::Arc;
use std::time::Duration;

use crate::error::OperationError;
use crate::lock::CancelToken;
use crate::record::{Locked, Record, RecordId, RecordStore, StoreError, Versioned};

pub struct PessimisticController<S> {
    store: Arc<S>,
    lock_timeout: Duration,
}

impl<S> Clone for PessimisticController<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            lock_timeout: self.lock_timeout,
        }
    }
}

impl<S: RecordStore> PessimisticController<S> {
    pub fn new(store: Arc<S>, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Take the record lock. The returned guard releases when dropped.
    pub fn lock<R: Record>(
        &self,
        id: RecordId,
        cancel: &CancelToken,
    ) -> Result<Locked<R>, OperationError> {
        match self.store.locking_get::<R>(id, self.lock_timeout, cancel) {
            Ok(locked) => Ok(locked),
            Err(
                err @ (StoreError::LockTimeout { .. } | StoreError::Interrupted { .. }),
            ) => {
                tracing::warn!(
                    collection = R::COLLECTION,
                    id,
                    error = %err,
                    "could not lock record"
                );
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Lock the record, let `f` check and transform it, write the result and
    /// release.
    ///
    /// If `f` rejects the record, the lock is released before its error is
    /// returned and nothing is written.
    pub fn transact<R, F>(
        &self,
        id: RecordId,
        cancel: &CancelToken,
        f: F,
    ) -> Result<Versioned<R>, OperationError>
    where
        R: Record,
        F: FnOnce(&Versioned<R>) -> Result<R, OperationError>,
    {
        let mut locked = self.lock::<R>(id, cancel)?;

        let next = match f(&locked.record) {
            Ok(next) => next,
            Err(rejection) => {
                self.release(&mut locked);
                return Err(rejection);
            }
        };

        let written = self.store.write(&locked.handle, &next)?;
        self.release(&mut locked);
        Ok(written)
    }

    fn release<R: Record>(&self, locked: &mut Locked<R>) {
        if let Err(err) = self.store.release(&mut locked.handle) {
            tracing::error!(
                collection = R::COLLECTION,
                id = locked.record.id,
                error = %err,
                "failed to release record lock"
            );
        }
    }
}
