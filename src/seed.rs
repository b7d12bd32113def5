//! Sample data for an empty store.

use crate::domain::{InventoryItem, Ticket};
use crate::engine::Engine;
use crate::error::OperationError;
use crate::record::{RecordStore, RecordsExt};

/// How many records `seed` created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub tickets: usize,
    pub inventory_items: usize,
}

/// Create the sample tickets and inventory items.
///
/// Each collection is only seeded while it is empty, so running this again
/// (or against a store that already has data) creates nothing.
pub fn seed<S: RecordStore>(engine: &Engine<S>) -> Result<SeedReport, OperationError> {
    tracing::info!("initializing sample data");
    let mut report = SeedReport::default();

    if engine.store().records::<Ticket>().is_empty()? {
        let tickets = [
            Ticket::new("Concert - Taylor Swift"),
            Ticket::new("Football Match - Arsenal vs Chelsea"),
            Ticket {
                name: "Theater - Hamilton".into(),
                booked: true,
            },
        ];
        for ticket in tickets {
            engine.tickets().create(ticket)?;
            report.tickets += 1;
        }
        tracing::info!(count = report.tickets, "created sample tickets");
    }

    if engine.store().records::<InventoryItem>().is_empty()? {
        let items = [
            InventoryItem::new("iPhone 15", 25),
            InventoryItem::new("MacBook Pro", 10),
            InventoryItem::new("AirPods Pro", 50),
        ];
        for item in items {
            engine.inventory().create(item)?;
            report.inventory_items += 1;
        }
        tracing::info!(count = report.inventory_items, "created sample inventory items");
    }

    tracing::info!(?report, "data initialization completed");
    Ok(report)
}
