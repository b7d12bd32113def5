use std::fmt;
use std::time::Duration;

use crate::record::{RecordId, StoreError};

/// Error returned by domain operations and both concurrency controllers.
///
/// Every failure means the write did not happen; nothing is retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// No such record.
    NotFound { collection: String, id: RecordId },
    /// The caller supplied an argument that can never succeed.
    InvalidArgument(String),
    /// A business rule rejected the operation against the current state.
    PreconditionFailed(String),
    /// A reduction asked for more than is available.
    InsufficientQuantity { current: i64, requested: i64 },
    /// Optimistic version mismatch: someone else wrote the record first.
    Conflict {
        collection: String,
        id: RecordId,
        expected: u64,
        actual: u64,
    },
    /// The record lock was not available before the deadline.
    LockTimeout {
        collection: String,
        id: RecordId,
        waited: Duration,
    },
    /// The caller gave up while waiting for the record lock.
    Interrupted { collection: String, id: RecordId },
    /// Anything unexpected (storage, codec or lock backend failure).
    Internal(String),
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationError::NotFound { collection, id } => {
                write!(f, "not found: {}:{}", collection, id)
            }
            OperationError::InvalidArgument(msg) => write!(f, "{}", msg),
            OperationError::PreconditionFailed(msg) => write!(f, "{}", msg),
            OperationError::InsufficientQuantity { current, requested } => write!(
                f,
                "Insufficient quantity available. Current: {}, Requested: {}",
                current, requested
            ),
            OperationError::Conflict {
                collection,
                id,
                expected,
                actual,
            } => write!(
                f,
                "conflict on {}:{} (read version {}, stored version {})",
                collection, id, expected, actual
            ),
            OperationError::LockTimeout {
                collection,
                id,
                waited,
            } => write!(
                f,
                "could not lock {}:{} within {:?}",
                collection, id, waited
            ),
            OperationError::Interrupted { collection, id } => {
                write!(f, "interrupted while waiting for {}:{}", collection, id)
            }
            OperationError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for OperationError {}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => OperationError::NotFound { collection, id },
            StoreError::VersionConflict {
                collection,
                id,
                expected,
                actual,
            } => OperationError::Conflict {
                collection,
                id,
                expected,
                actual,
            },
            StoreError::LockTimeout {
                collection,
                id,
                waited,
            } => OperationError::LockTimeout {
                collection,
                id,
                waited,
            },
            StoreError::Interrupted { collection, id } => {
                OperationError::Interrupted { collection, id }
            }
            other @ (StoreError::LockNotHeld { .. }
            | StoreError::Lock(_)
            | StoreError::Codec(_)
            | StoreError::Storage(_)) => OperationError::Internal(other.to_string()),
        }
    }
}

impl OperationError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            OperationError::NotFound { .. } => 404,
            OperationError::InvalidArgument(_) => 400,
            OperationError::PreconditionFailed(_) => 409,
            OperationError::InsufficientQuantity { .. } => 400,
            OperationError::Conflict { .. } => 409,
            OperationError::LockTimeout { .. } => 409,
            OperationError::Interrupted { .. } => 500,
            OperationError::Internal(_) => 500,
        }
    }

    /// Errors whose detail stays in the server log.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            OperationError::Interrupted { .. } | OperationError::Internal(_)
        )
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self {
            OperationError::Conflict { .. } => {
                "Another user has modified this item. Please refresh and try again.".into()
            }
            OperationError::LockTimeout { .. } => {
                "Could not acquire lock on the resource. Please try again.".into()
            }
            OperationError::Interrupted { .. } => {
                "Operation was interrupted. Please try again.".into()
            }
            OperationError::Internal(_) => {
                "An unexpected error occurred. Please try again later.".into()
            }
            other => other.to_string(),
        }
    }
}
