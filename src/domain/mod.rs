//! Domain operations layered on the two concurrency controllers.
//!
//! - Ticket booking uses pessimistic locking: two buyers of the same ticket
//!   are serialized, the second sees the ticket already booked.
//! - Inventory quantity changes use optimistic locking: concurrent updates
//!   are detected by version and the loser gets `Conflict`.

mod inventory;
mod ticket;

pub use inventory::{InventoryItem, InventoryService};
pub use ticket::{Ticket, TicketService};
