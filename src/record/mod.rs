//! Records - versioned, key-addressed storage with two write paths.
//!
//! A record is a typed payload stored under `(collection, id)`. The store owns
//! the `id` (assigned on insert) and the `version` (bumped on every successful
//! write); callers only ever supply payloads.
//!
//! Mutations go through exactly two entry points:
//! - `conditional_write` compares the stored version with the caller's
//!   expected version and fails fast on mismatch (optimistic path).
//! - `write` persists under an exclusive lock obtained with `locking_get`
//!   (pessimistic path).
//!
//! ## Example
//!
//! ```ignore
//! use locking_rust::{InMemoryRecordStore, Record, RecordStore, RecordsExt};
//!
//! #[derive(Clone, Serialize, Deserialize, Record)]
//! #[record(collection = "tickets")]
//! struct Ticket { name: String, booked: bool }
//!
//! let store = InMemoryRecordStore::new();
//! let created = store.records::<Ticket>().insert(&ticket)?;
//! let current = store.get::<Ticket>(created.id)?;
//! store.conditional_write(current.id, &changed, current.version)?;
//! ```

mod handle;
mod in_memory;
mod repository;
mod store;

use std::fmt;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::lock::LockError;

/// Store-assigned record identifier, unique within a collection.
pub type RecordId = u64;

/// Trait for payload types that can be stored as records.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this record type (e.g. "tickets").
    /// Maps to a table in SQL, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;
}

/// A record payload together with its store-owned identity and version.
///
/// Serializes flat: `{ "id": 1, "version": 2, "name": ..., ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub id: RecordId,
    pub version: u64,
    #[serde(flatten)]
    pub data: T,
}

/// Error type for record store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id in the collection.
    NotFound { collection: String, id: RecordId },
    /// Optimistic concurrency conflict: the stored version moved on.
    VersionConflict {
        collection: String,
        id: RecordId,
        expected: u64,
        actual: u64,
    },
    /// The record lock could not be acquired before the deadline.
    LockTimeout {
        collection: String,
        id: RecordId,
        waited: Duration,
    },
    /// The caller cancelled while waiting for the record lock.
    Interrupted { collection: String, id: RecordId },
    /// A locked write was attempted with a handle that does not hold the lock.
    LockNotHeld { collection: String, id: RecordId },
    /// Any other failure of the lock backend.
    Lock(LockError),
    /// Payload encoding/decoding error.
    Codec(String),
    /// Storage-level error.
    Storage(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { collection, id } => {
                write!(f, "record not found: {}:{}", collection, id)
            }
            StoreError::VersionConflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "version conflict on {}:{} (expected version {}, actual {})",
                collection, id, expected, actual
            ),
            StoreError::LockTimeout {
                collection,
                id,
                waited,
            } => write!(
                f,
                "timed out after {:?} waiting for lock on {}:{}",
                waited, collection, id
            ),
            StoreError::Interrupted { collection, id } => {
                write!(f, "interrupted while waiting for lock on {}:{}", collection, id)
            }
            StoreError::LockNotHeld { collection, id } => {
                write!(f, "lock on {}:{} is not held by this handle", collection, id)
            }
            StoreError::Lock(e) => write!(f, "record lock error: {}", e),
            StoreError::Codec(msg) => write!(f, "record codec error: {}", msg),
            StoreError::Storage(msg) => write!(f, "record storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Lock(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LockError> for StoreError {
    fn from(err: LockError) -> Self {
        StoreError::Lock(err)
    }
}

pub use handle::{LockHandle, Locked};
pub use in_memory::InMemoryRecordStore;
pub use repository::{RecordRepository, RecordsExt};
pub use store::RecordStore;
