//! RecordRepository - Typed accessor for the read/create side of a record store.

use std::marker::PhantomData;

use super::{Record, RecordId, RecordStore, StoreError, Versioned};

/// Typed repository wrapper for accessing records of a specific type.
///
/// Only exposes operations that do not mutate existing records; updates go
/// through the optimistic or pessimistic controller.
pub struct RecordRepository<'a, S, R> {
    store: &'a S,
    _marker: PhantomData<R>,
}

impl<'a, S: RecordStore, R: Record> RecordRepository<'a, S, R> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a record by id.
    pub fn get(&self, id: RecordId) -> Result<Versioned<R>, StoreError> {
        self.store.get(id)
    }

    /// All records of this type, ordered by id.
    pub fn all(&self) -> Result<Vec<Versioned<R>>, StoreError> {
        self.store.list()
    }

    /// Number of records of this type.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.store.count::<R>()
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.count()? == 0)
    }

    /// Create a new record.
    pub fn insert(&self, data: &R) -> Result<Versioned<R>, StoreError> {
        self.store.insert(data)
    }
}

/// Extension trait for typed record access on any RecordStore.
pub trait RecordsExt: RecordStore + Sized {
    /// Get a typed record repository.
    fn records<R: Record>(&self) -> RecordRepository<'_, Self, R> {
        RecordRepository::new(self)
    }
}

impl<S: RecordStore> RecordsExt for S {}
