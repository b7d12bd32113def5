use std::fmt;
use std::time::Duration;

/// Error type for lock operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The underlying lock primitive was poisoned (e.g. a thread panicked while holding it).
    Poisoned(String),
    /// The lock could not be acquired before the deadline.
    Timeout { key: String, waited: Duration },
    /// The waiter was cancelled before the lock became available.
    Interrupted { key: String },
    /// Failed to release the lock.
    ReleaseFailed(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Poisoned(msg) => write!(f, "lock poisoned: {}", msg),
            LockError::Timeout { key, waited } => {
                write!(f, "timed out after {:?} waiting for lock on {}", waited, key)
            }
            LockError::Interrupted { key } => {
                write!(f, "interrupted while waiting for lock on {}", key)
            }
            LockError::ReleaseFailed(msg) => write!(f, "lock release failed: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}
