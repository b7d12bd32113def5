//! Optimistic concurrency control: detect conflicting writers at write time.
//!
//! A writer reads a record, remembers the version it saw, computes the new
//! payload and hands both back to `RecordStore::conditional_write`. If any
//! other write landed in between, the stored version has moved on and the
//! write fails with `Conflict`. Nothing blocks and nothing is retried; the
//! caller decides whether to read again.

use std::sync::Arc;

use crate::error::OperationError;
use crate::record::{Record, RecordId, RecordStore, StoreError, Versioned};

pub struct OptimisticController<S> {
    store: Arc<S>,
}

impl<S> Clone for OptimisticController<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RecordStore> OptimisticController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Phase one: read the record and capture its version.
    pub fn read<R: Record>(&self, id: RecordId) -> Result<Versioned<R>, OperationError> {
        Ok(self.store.get(id)?)
    }

    /// Phase two: write `data` only if the record is still at the version
    /// `snapshot` was read at.
    pub fn commit<R: Record>(
        &self,
        snapshot: &Versioned<R>,
        data: &R,
    ) -> Result<Versioned<R>, OperationError> {
        match self.store.conditional_write(snapshot.id, data, snapshot.version) {
            Ok(written) => Ok(written),
            Err(err @ StoreError::VersionConflict { .. }) => {
                tracing::warn!(
                    collection = R::COLLECTION,
                    id = snapshot.id,
                    read_version = snapshot.version,
                    error = %err,
                    "optimistic write lost the race"
                );
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read, apply `mutate`, and conditionally write the result.
    ///
    /// `mutate` sees the snapshot and may reject it; its error is returned
    /// as is and nothing is written.
    pub fn read_modify_write<R, F>(
        &self,
        id: RecordId,
        mutate: F,
    ) -> Result<Versioned<R>, OperationError>
    where
        R: Record,
        F: FnOnce(&Versioned<R>) -> Result<R, OperationError>,
    {
        let snapshot = self.read::<R>(id)?;
        let next = mutate(&snapshot)?;
        self.commit(&snapshot, &next)
    }
}
