//! Exclusive per-record locks with bounded, cancellable waits.

mod cancel;
mod error;
mod in_memory;
#[allow(clippy::module_inception)]
mod lock;
mod lock_manager;

pub use cancel::{CancelOnDrop, CancelToken};
pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock::{LeaseId, Lock};
pub use lock_manager::LockManager;
