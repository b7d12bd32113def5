use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::delay::{OperationKind, ProcessingDelay};
use crate::error::OperationError;
use crate::lock::CancelToken;
use crate::pessimistic::PessimisticController;
use crate::record::{RecordId, RecordStore, RecordsExt, Versioned};
use crate::Record;

/// A bookable ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "tickets")]
pub struct Ticket {
    pub name: String,
    #[serde(default)]
    pub booked: bool,
}

impl Ticket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            booked: false,
        }
    }
}

/// Ticket operations. Booking and cancellation run under the ticket's
/// exclusive lock.
pub struct TicketService<S> {
    store: Arc<S>,
    locking: PessimisticController<S>,
    delay: Arc<dyn ProcessingDelay>,
}

impl<S> Clone for TicketService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locking: self.locking.clone(),
            delay: self.delay.clone(),
        }
    }
}

impl<S: RecordStore> TicketService<S> {
    pub fn new(
        store: Arc<S>,
        locking: PessimisticController<S>,
        delay: Arc<dyn ProcessingDelay>,
    ) -> Self {
        Self {
            store,
            locking,
            delay,
        }
    }

    pub fn list(&self) -> Result<Vec<Versioned<Ticket>>, OperationError> {
        Ok(self.store.records::<Ticket>().all()?)
    }

    pub fn create(&self, ticket: Ticket) -> Result<Versioned<Ticket>, OperationError> {
        tracing::info!(name = %ticket.name, "creating ticket");
        Ok(self.store.records::<Ticket>().insert(&ticket)?)
    }

    pub fn get(&self, id: RecordId) -> Result<Versioned<Ticket>, OperationError> {
        Ok(self.store.records::<Ticket>().get(id)?)
    }

    /// Book a ticket, waiting at most the configured lock timeout for any
    /// booking already in flight.
    pub fn book(&self, id: RecordId) -> Result<Versioned<Ticket>, OperationError> {
        self.book_with(id, &CancelToken::new())
    }

    /// Like `book`, but gives up with `Interrupted` once `cancel` fires.
    pub fn book_with(
        &self,
        id: RecordId,
        cancel: &CancelToken,
    ) -> Result<Versioned<Ticket>, OperationError> {
        tracing::info!(id, "attempting to book ticket");

        let booked = self.locking.transact::<Ticket, _>(id, cancel, |current| {
            if current.data.booked {
                tracing::warn!(id, "ticket is already booked");
                return Err(OperationError::PreconditionFailed(
                    "Ticket is already booked".into(),
                ));
            }
            self.delay.pause(OperationKind::BookTicket);
            Ok(Ticket {
                booked: true,
                ..current.data.clone()
            })
        })?;

        tracing::info!(
            id,
            name = %booked.data.name,
            version = booked.version,
            "ticket booked"
        );
        Ok(booked)
    }

    /// Mark a ticket as not booked, whatever its current state.
    pub fn cancel_booking(&self, id: RecordId) -> Result<Versioned<Ticket>, OperationError> {
        self.cancel_booking_with(id, &CancelToken::new())
    }

    /// Like `cancel_booking`, but gives up with `Interrupted` once `cancel`
    /// fires.
    ///
    /// Runs under the ticket lock so it queues behind an in-flight booking
    /// instead of racing its write.
    pub fn cancel_booking_with(
        &self,
        id: RecordId,
        cancel: &CancelToken,
    ) -> Result<Versioned<Ticket>, OperationError> {
        let cancelled = self.locking.transact::<Ticket, _>(id, cancel, |current| {
            Ok(Ticket {
                booked: false,
                ..current.data.clone()
            })
        })?;

        tracing::info!(
            id,
            name = %cancelled.data.name,
            version = cancelled.version,
            "cancelled booking"
        );
        Ok(cancelled)
    }
}
