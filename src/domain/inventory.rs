use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::delay::{OperationKind, ProcessingDelay};
use crate::error::OperationError;
use crate::optimistic::OptimisticController;
use crate::record::{RecordId, RecordStore, RecordsExt, Versioned};
use crate::Record;

/// A stocked item. `quantity` never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Record)]
#[record(collection = "inventory_items")]
pub struct InventoryItem {
    pub name: String,
    pub quantity: i64,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Inventory operations. Quantity changes use optimistic version checks.
pub struct InventoryService<S> {
    store: Arc<S>,
    versioning: OptimisticController<S>,
    delay: Arc<dyn ProcessingDelay>,
}

impl<S> Clone for InventoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            versioning: self.versioning.clone(),
            delay: self.delay.clone(),
        }
    }
}

impl<S: RecordStore> InventoryService<S> {
    pub fn new(
        store: Arc<S>,
        versioning: OptimisticController<S>,
        delay: Arc<dyn ProcessingDelay>,
    ) -> Self {
        Self {
            store,
            versioning,
            delay,
        }
    }

    pub fn list(&self) -> Result<Vec<Versioned<InventoryItem>>, OperationError> {
        Ok(self.store.records::<InventoryItem>().all()?)
    }

    pub fn create(&self, item: InventoryItem) -> Result<Versioned<InventoryItem>, OperationError> {
        if item.quantity < 0 {
            return Err(OperationError::InvalidArgument(
                "Quantity cannot be negative".into(),
            ));
        }
        tracing::info!(name = %item.name, quantity = item.quantity, "creating inventory item");
        Ok(self.store.records::<InventoryItem>().insert(&item)?)
    }

    pub fn get(&self, id: RecordId) -> Result<Versioned<InventoryItem>, OperationError> {
        Ok(self.store.records::<InventoryItem>().get(id)?)
    }

    /// Overwrite the quantity. Fails with `Conflict` if the item changed
    /// after it was read.
    pub fn update_quantity(
        &self,
        id: RecordId,
        new_quantity: i64,
    ) -> Result<Versioned<InventoryItem>, OperationError> {
        tracing::info!(id, new_quantity, "attempting to update inventory quantity");

        let saved = self
            .versioning
            .read_modify_write::<InventoryItem, _>(id, |current| {
                if new_quantity < 0 {
                    return Err(OperationError::InvalidArgument(
                        "Quantity cannot be negative".into(),
                    ));
                }
                self.delay.pause(OperationKind::UpdateQuantity);
                Ok(InventoryItem {
                    quantity: new_quantity,
                    ..current.data.clone()
                })
            })?;

        tracing::info!(
            id,
            name = %saved.data.name,
            quantity = saved.data.quantity,
            version = saved.version,
            "updated inventory quantity"
        );
        Ok(saved)
    }

    /// Take `amount` units out of stock. Fails with `InsufficientQuantity`
    /// rather than going negative, and with `Conflict` if the item changed
    /// after it was read.
    pub fn reduce_quantity(
        &self,
        id: RecordId,
        amount: i64,
    ) -> Result<Versioned<InventoryItem>, OperationError> {
        tracing::info!(id, amount, "attempting to reduce inventory quantity");

        let saved = self
            .versioning
            .read_modify_write::<InventoryItem, _>(id, |current| {
                if amount <= 0 {
                    return Err(OperationError::InvalidArgument(
                        "Reduction amount must be positive".into(),
                    ));
                }
                if current.data.quantity < amount {
                    return Err(OperationError::InsufficientQuantity {
                        current: current.data.quantity,
                        requested: amount,
                    });
                }
                self.delay.pause(OperationKind::ReduceQuantity);
                Ok(InventoryItem {
                    quantity: current.data.quantity - amount,
                    ..current.data.clone()
                })
            })?;

        tracing::info!(
            id,
            name = %saved.data.name,
            amount,
            quantity = saved.data.quantity,
            "reduced inventory quantity"
        );
        Ok(saved)
    }
}
