use std::sync::{Arc, Barrier, Mutex};
use std::time::{Duration, Instant};

use locking_rust::{Engine, EngineConfig, InMemoryRecordStore, OperationKind, ProcessingDelay};

/// Holds every caller at a barrier until `n` of them have read their record.
/// Guarantees that `n` optimistic writers all work from the same version.
pub struct BarrierDelay {
    barrier: Barrier,
}

impl BarrierDelay {
    pub fn new(n: usize) -> Self {
        Self {
            barrier: Barrier::new(n),
        }
    }
}

impl ProcessingDelay for BarrierDelay {
    fn pause(&self, _op: OperationKind) {
        self.barrier.wait();
    }
}

/// Sleeps like a fixed delay and records when each pause ended.
pub struct TimedDelay {
    duration: Duration,
    finished: Mutex<Vec<Instant>>,
}

impl TimedDelay {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            finished: Mutex::new(Vec::new()),
        }
    }

    pub fn finished(&self) -> Vec<Instant> {
        self.finished.lock().unwrap().clone()
    }
}

impl ProcessingDelay for TimedDelay {
    fn pause(&self, _op: OperationKind) {
        std::thread::sleep(self.duration);
        self.finished.lock().unwrap().push(Instant::now());
    }
}

pub fn engine_with(
    delay: Arc<dyn ProcessingDelay>,
    lock_timeout: Duration,
) -> Engine<InMemoryRecordStore> {
    let config = EngineConfig::default().with_lock_timeout(lock_timeout);
    Engine::with_delay(Arc::new(InMemoryRecordStore::new()), config, delay)
}
