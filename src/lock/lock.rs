use std::time::Duration;

use super::{CancelToken, LockError};

/// Identifies one successful acquisition of a lock.
///
/// Release and ownership checks are keyed by lease, so a stale holder can
/// never release a lock that has since been granted to someone else.
pub type LeaseId = u64;

/// Trait for a single exclusive lock instance.
///
/// In-memory locks use `Mutex` + `Condvar`; a SQL backend might map this to
/// `SELECT ... FOR UPDATE` inside a transaction, a KV store to a lease key.
pub trait Lock: Send + Sync {
    /// Acquire the lock, blocking until it becomes available, `timeout`
    /// elapses, or `cancel` fires. On error, the lock is not held.
    fn acquire(&self, timeout: Duration, cancel: &CancelToken) -> Result<LeaseId, LockError>;

    /// Try to acquire the lock without blocking.
    /// Returns `Ok(None)` if it is already held.
    fn try_acquire(&self) -> Result<Option<LeaseId>, LockError>;

    /// Release the lock if `lease` still holds it. Releasing twice, or with a
    /// stale lease, is a no-op.
    fn release(&self, lease: LeaseId) -> Result<(), LockError>;

    /// Whether `lease` is the current holder.
    fn is_held_by(&self, lease: LeaseId) -> Result<bool, LockError>;
}
