//! Engine - wires one record store into both domain services.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::delay::ProcessingDelay;
use crate::domain::{InventoryService, TicketService};
use crate::optimistic::OptimisticController;
use crate::pessimistic::PessimisticController;
use crate::record::{InMemoryRecordStore, RecordStore};

/// The store plus everything layered on it.
///
/// The store is injected and shared: tickets and inventory live in the same
/// store, and clones of the engine share it too.
pub struct Engine<S = InMemoryRecordStore> {
    store: Arc<S>,
    tickets: TicketService<S>,
    inventory: InventoryService<S>,
}

impl<S> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            tickets: self.tickets.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

impl Engine<InMemoryRecordStore> {
    /// An engine over a fresh in-memory store.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(Arc::new(InMemoryRecordStore::new()), config)
    }
}

impl<S: RecordStore> Engine<S> {
    /// Build an engine whose processing delays follow `config.delays`.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self::with_delay(store, config, Arc::new(config.delays))
    }

    /// Build an engine with a custom delay strategy; `config.delays` is ignored.
    pub fn with_delay(
        store: Arc<S>,
        config: EngineConfig,
        delay: Arc<dyn ProcessingDelay>,
    ) -> Self {
        let tickets = TicketService::new(
            store.clone(),
            PessimisticController::new(store.clone(), config.lock_timeout),
            delay.clone(),
        );
        let inventory = InventoryService::new(
            store.clone(),
            OptimisticController::new(store.clone()),
            delay,
        );

        Self {
            store,
            tickets,
            inventory,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn tickets(&self) -> &TicketService<S> {
        &self.tickets
    }

    pub fn inventory(&self) -> &InventoryService<S> {
        &self.inventory
    }
}
