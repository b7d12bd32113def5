//! InMemoryRecordStore - BTreeMap-backed record store for tests, demos and the server.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::lock::{CancelToken, InMemoryLockManager, Lock, LockError, LockManager};

use super::{LockHandle, Locked, Record, RecordId, RecordStore, StoreError, Versioned};

/// Internal stored representation of a record.
struct StoredRecord {
    bytes: Vec<u8>,
    version: u64,
}

#[derive(Default)]
struct Tables {
    records: BTreeMap<(&'static str, RecordId), StoredRecord>,
    sequences: HashMap<&'static str, RecordId>,
}

impl Tables {
    fn next_id(&mut self, collection: &'static str) -> RecordId {
        let seq = self.sequences.entry(collection).or_insert(0);
        *seq += 1;
        *seq
    }
}

/// In-memory record store.
///
/// Every write takes the table write lock, which makes `conditional_write` a
/// single atomic compare-and-swap. Record locks come from the `LockManager`
/// and are keyed `"collection:id"`, so different record types never contend.
/// Clone-friendly via Arc: clones share both the records and the locks.
pub struct InMemoryRecordStore<M: LockManager = InMemoryLockManager> {
    tables: Arc<RwLock<Tables>>,
    locks: Arc<M>,
}

impl<M: LockManager> Clone for InMemoryRecordStore<M> {
    fn clone(&self) -> Self {
        Self {
            tables: self.tables.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    /// Create a new empty store with in-memory record locks.
    pub fn new() -> Self {
        Self::with_lock_manager(InMemoryLockManager::new())
    }
}

impl<M: LockManager> InMemoryRecordStore<M> {
    /// Create a new empty store that takes record locks from `locks`.
    pub fn with_lock_manager(locks: M) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            locks: Arc::new(locks),
        }
    }

    /// Access the lock manager.
    pub fn lock_manager(&self) -> &M {
        &self.locks
    }

    fn lock_key(collection: &str, id: RecordId) -> String {
        format!("{}:{}", collection, id)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    fn write_tables(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }

    fn not_found<R: Record>(id: RecordId) -> StoreError {
        StoreError::NotFound {
            collection: R::COLLECTION.to_string(),
            id,
        }
    }

    fn exists<R: Record>(&self, id: RecordId) -> Result<bool, StoreError> {
        Ok(self.read()?.records.contains_key(&(R::COLLECTION, id)))
    }
}

fn encode<R: Record>(data: &R) -> Result<Vec<u8>, StoreError> {
    bitcode::serialize(data).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<R: Record>(id: RecordId, stored: &StoredRecord) -> Result<Versioned<R>, StoreError> {
    let data: R =
        bitcode::deserialize(&stored.bytes).map_err(|e| StoreError::Codec(e.to_string()))?;
    Ok(Versioned {
        id,
        version: stored.version,
        data,
    })
}

impl<M: LockManager> RecordStore for InMemoryRecordStore<M> {
    fn get<R: Record>(&self, id: RecordId) -> Result<Versioned<R>, StoreError> {
        let tables = self.read()?;
        let stored = tables
            .records
            .get(&(R::COLLECTION, id))
            .ok_or_else(|| Self::not_found::<R>(id))?;
        decode(id, stored)
    }

    fn list<R: Record>(&self) -> Result<Vec<Versioned<R>>, StoreError> {
        let tables = self.read()?;
        tables
            .records
            .range((R::COLLECTION, RecordId::MIN)..=(R::COLLECTION, RecordId::MAX))
            .map(|((_, id), stored)| decode(*id, stored))
            .collect()
    }

    fn count<R: Record>(&self) -> Result<usize, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .records
            .range((R::COLLECTION, RecordId::MIN)..=(R::COLLECTION, RecordId::MAX))
            .count())
    }

    fn insert<R: Record>(&self, data: &R) -> Result<Versioned<R>, StoreError> {
        let bytes = encode(data)?;
        let mut tables = self.write_tables()?;
        let id = tables.next_id(R::COLLECTION);
        tables
            .records
            .insert((R::COLLECTION, id), StoredRecord { bytes, version: 1 });

        Ok(Versioned {
            id,
            version: 1,
            data: data.clone(),
        })
    }

    fn conditional_write<R: Record>(
        &self,
        id: RecordId,
        data: &R,
        expected_version: u64,
    ) -> Result<Versioned<R>, StoreError> {
        let bytes = encode(data)?;
        let mut tables = self.write_tables()?;

        let stored = tables
            .records
            .get_mut(&(R::COLLECTION, id))
            .ok_or_else(|| Self::not_found::<R>(id))?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                collection: R::COLLECTION.to_string(),
                id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        stored.bytes = bytes;
        stored.version += 1;

        Ok(Versioned {
            id,
            version: stored.version,
            data: data.clone(),
        })
    }

    fn locking_get<R: Record>(
        &self,
        id: RecordId,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Locked<R>, StoreError> {
        if !self.exists::<R>(id)? {
            return Err(Self::not_found::<R>(id));
        }

        let lock = self.locks.get_lock(&Self::lock_key(R::COLLECTION, id))?;
        let lease = lock.acquire(timeout, cancel).map_err(|e| match e {
            LockError::Timeout { waited, .. } => StoreError::LockTimeout {
                collection: R::COLLECTION.to_string(),
                id,
                waited,
            },
            LockError::Interrupted { .. } => StoreError::Interrupted {
                collection: R::COLLECTION.to_string(),
                id,
            },
            other => StoreError::Lock(other),
        })?;
        tracing::debug!(collection = R::COLLECTION, id, "record lock acquired");

        let lock: Arc<dyn Lock> = lock;
        let handle = LockHandle::new(R::COLLECTION, id, lease, lock);

        // On error the handle drops here and gives the lock back.
        let record = self.get::<R>(id)?;
        Ok(Locked { record, handle })
    }

    fn write<R: Record>(&self, handle: &LockHandle, data: &R) -> Result<Versioned<R>, StoreError> {
        let id = handle.id();
        if !handle.covers(R::COLLECTION, id) || !handle.is_held()? {
            return Err(StoreError::LockNotHeld {
                collection: R::COLLECTION.to_string(),
                id,
            });
        }

        let bytes = encode(data)?;
        let mut tables = self.write_tables()?;
        let stored = tables
            .records
            .get_mut(&(R::COLLECTION, id))
            .ok_or_else(|| Self::not_found::<R>(id))?;

        stored.bytes = bytes;
        stored.version += 1;

        Ok(Versioned {
            id,
            version: stored.version,
            data: data.clone(),
        })
    }
}
