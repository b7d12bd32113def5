//! Optimistic and pessimistic concurrency control over a pluggable record store.
//!
//! - [`RecordStore`] is the storage contract: `get`, `conditional_write`
//!   (atomic version compare-and-swap), `locking_get` + `write` (exclusive
//!   record lock with a bounded, cancellable wait).
//! - [`OptimisticController`] detects conflicting writers by version and
//!   reports `Conflict`.
//! - [`PessimisticController`] prevents them by holding the record lock for
//!   the whole read-modify-write.
//! - [`TicketService`] books tickets pessimistically; [`InventoryService`]
//!   adjusts stock optimistically.

// Lets `#[derive(Record)]` expand to `::locking_rust::Record` inside this crate too.
extern crate self as locking_rust;

mod config;
mod delay;
mod domain;
mod engine;
mod error;
mod optimistic;
mod pessimistic;
mod record;
mod seed;

pub mod lock;

#[cfg(feature = "http")]
pub mod http;

pub use config::{EngineConfig, DEFAULT_LOCK_TIMEOUT};
pub use delay::{DelayProfile, FixedDelay, NoDelay, OperationKind, ProcessingDelay};
pub use domain::{InventoryItem, InventoryService, Ticket, TicketService};
pub use engine::Engine;
pub use error::OperationError;
pub use lock::{CancelToken, InMemoryLockManager};
pub use optimistic::OptimisticController;
pub use pessimistic::PessimisticController;
pub use record::{
    InMemoryRecordStore, LockHandle, Locked, Record, RecordId, RecordRepository, RecordStore,
    RecordsExt, StoreError, Versioned,
};
pub use seed::{seed, SeedReport};

// Re-export the derive macro alongside the trait it implements.
pub use locking_rust_macros::Record;
