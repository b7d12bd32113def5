use std::time::Duration;

use crate::delay::DelayProfile;

/// How long a pessimistic transaction waits for a record lock by default.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on a `locking_get` wait before it fails with `LockTimeout`.
    pub lock_timeout: Duration,
    /// Simulated processing time per domain operation.
    pub delays: DelayProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            delays: DelayProfile::none(),
        }
    }
}

impl EngineConfig {
    /// Default lock timeout with the demo processing delays switched on.
    pub fn demo() -> Self {
        Self::default().with_delays(DelayProfile::demo())
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_delays(mut self, delays: DelayProfile) -> Self {
        self.delays = delays;
        self
    }
}
