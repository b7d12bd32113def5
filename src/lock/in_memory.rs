use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{CancelToken, LeaseId, Lock, LockError, LockManager};

/// Upper bound on how long a waiter sleeps before re-checking its cancel token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct LockState {
    holder: Option<LeaseId>,
    last_lease: LeaseId,
}

impl LockState {
    fn grant(&mut self) -> LeaseId {
        self.last_lease += 1;
        self.holder = Some(self.last_lease);
        self.last_lease
    }
}

/// In-memory exclusive lock backed by `Mutex<LockState>` + `Condvar`.
///
/// Waiters are woken on release and also re-check their deadline and cancel
/// token every few milliseconds. Acquisition order is not FIFO.
pub struct InMemoryLock {
    key: String,
    state: Mutex<LockState>,
    wake: Condvar,
}

impl InMemoryLock {
    pub fn new(key: impl Into<String>) -> Self {
        InMemoryLock {
            key: key.into(),
            state: Mutex::new(LockState::default()),
            wake: Condvar::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether anyone currently holds the lock.
    pub fn is_locked(&self) -> Result<bool, LockError> {
        Ok(self.state()?.holder.is_some())
    }

    fn state(&self) -> Result<MutexGuard<'_, LockState>, LockError> {
        self.state
            .lock()
            .map_err(|e| LockError::Poisoned(e.to_string()))
    }
}

impl Lock for InMemoryLock {
    fn acquire(&self, timeout: Duration, cancel: &CancelToken) -> Result<LeaseId, LockError> {
        let started = Instant::now();
        let deadline = started.checked_add(timeout);
        let mut state = self.state()?;

        loop {
            if cancel.is_cancelled() {
                return Err(LockError::Interrupted {
                    key: self.key.clone(),
                });
            }
            if state.holder.is_none() {
                return Ok(state.grant());
            }

            let now = Instant::now();
            let slice = match deadline {
                Some(deadline) if now >= deadline => {
                    return Err(LockError::Timeout {
                        key: self.key.clone(),
                        waited: now.duration_since(started),
                    });
                }
                Some(deadline) => (deadline - now).min(CANCEL_POLL_INTERVAL),
                None => CANCEL_POLL_INTERVAL,
            };

            let (guard, _) = self
                .wake
                .wait_timeout(state, slice)
                .map_err(|e| LockError::Poisoned(e.to_string()))?;
            state = guard;
        }
    }

    fn try_acquire(&self) -> Result<Option<LeaseId>, LockError> {
        let mut state = self.state()?;
        if state.holder.is_some() {
            Ok(None)
        } else {
            Ok(Some(state.grant()))
        }
    }

    fn release(&self, lease: LeaseId) -> Result<(), LockError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        if state.holder == Some(lease) {
            state.holder = None;
            // Timed-out waiters may swallow a single notification.
            self.wake.notify_all();
        }
        Ok(())
    }

    fn is_held_by(&self, lease: LeaseId) -> Result<bool, LockError> {
        Ok(self.state()?.holder == Some(lease))
    }
}

/// In-memory lock manager backed by a `HashMap<String, Arc<InMemoryLock>>`.
///
/// Lazily creates one `InMemoryLock` per unique key and returns the same
/// `Arc` for repeated lookups.
pub struct InMemoryLockManager {
    locks: Mutex<HashMap<String, Arc<InMemoryLock>>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        InMemoryLockManager {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager for InMemoryLockManager {
    type Lock = InMemoryLock;

    fn get_lock(&self, key: &str) -> Result<Arc<InMemoryLock>, LockError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LockError::Poisoned("lock manager map poisoned".into()))?;
        Ok(locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(InMemoryLock::new(key)))
            .clone())
    }
}
