//! Simulated processing delays.
//!
//! Domain operations pause between reading a record and writing it back to
//! model real work. The pause widens the race window so concurrent writers
//! interleave: optimistic writers collide, pessimistic writers queue behind
//! the lock. Production wiring uses `NoDelay`; demos use
//! `DelayProfile::demo()`; tests plug in their own strategy to force an
//! interleaving deterministically.

use std::thread;
use std::time::Duration;

/// The domain operations that pause while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    UpdateQuantity,
    ReduceQuantity,
    BookTicket,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::UpdateQuantity => "update_quantity",
            OperationKind::ReduceQuantity => "reduce_quantity",
            OperationKind::BookTicket => "book_ticket",
        }
    }
}

/// Strategy invoked between read and write of a domain operation.
pub trait ProcessingDelay: Send + Sync {
    fn pause(&self, op: OperationKind);
}

/// Never pauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl ProcessingDelay for NoDelay {
    fn pause(&self, _op: OperationKind) {}
}

/// Pauses every operation for the same duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl ProcessingDelay for FixedDelay {
    fn pause(&self, _op: OperationKind) {
        if !self.0.is_zero() {
            thread::sleep(self.0);
        }
    }
}

/// Per-operation pause durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayProfile {
    pub update_quantity: Duration,
    pub reduce_quantity: Duration,
    pub book_ticket: Duration,
}

impl DelayProfile {
    /// No pauses at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// The demo timings: updates take 5s, reductions 1s, bookings 2s.
    pub fn demo() -> Self {
        Self {
            update_quantity: Duration::from_secs(5),
            reduce_quantity: Duration::from_secs(1),
            book_ticket: Duration::from_secs(2),
        }
    }

    pub fn duration_for(&self, op: OperationKind) -> Duration {
        match op {
            OperationKind::UpdateQuantity => self.update_quantity,
            OperationKind::ReduceQuantity => self.reduce_quantity,
            OperationKind::BookTicket => self.book_ticket,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
}

impl ProcessingDelay for DelayProfile {
    fn pause(&self, op: OperationKind) {
        let duration = self.duration_for(op);
        if !duration.is_zero() {
            tracing::debug!(operation = op.as_str(), ?duration, "simulating processing");
            thread::sleep(duration);
        }
    }
}
