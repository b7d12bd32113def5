use std::sync::Arc;
use std::thread;
use std::time::Duration;

use locking_rust::{
    InventoryItem, NoDelay, OperationError, OptimisticController, RecordStore,
};

use crate::support::{engine_with, BarrierDelay};

#[test]
fn concurrent_updates_one_wins_one_conflicts() {
    let engine = engine_with(Arc::new(BarrierDelay::new(2)), Duration::from_secs(1));
    let item = engine
        .inventory()
        .create(InventoryItem::new("Book", 10))
        .unwrap();

    let id = item.id;
    let writers: Vec<_> = [5, 8]
        .into_iter()
        .map(|quantity| {
            let engine = engine.clone();
            thread::spawn(move || (quantity, engine.inventory().update_quantity(id, quantity)))
        })
        .collect();
    let results: Vec<_> = writers.into_iter().map(|w| w.join().unwrap()).collect();

    let winners: Vec<_> = results
        .iter()
        .filter_map(|(q, r)| r.as_ref().ok().map(|_| *q))
        .collect();
    let conflicts = results
        .iter()
        .filter(|(_, r)| matches!(r, Err(OperationError::Conflict { .. })))
        .count();
    assert_eq!(winners.len(), 1, "results: {results:?}");
    assert_eq!(conflicts, 1, "results: {results:?}");

    let stored = engine.inventory().get(item.id).unwrap();
    assert_eq!(stored.data.quantity, winners[0]);
    assert_eq!(stored.version, item.version + 1);
}

#[test]
fn concurrent_reductions_never_double_spend() {
    let engine = engine_with(Arc::new(BarrierDelay::new(2)), Duration::from_secs(1));
    let item = engine
        .inventory()
        .create(InventoryItem::new("MacBook Pro", 10))
        .unwrap();

    let id = item.id;
    let buyers: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || engine.inventory().reduce_quantity(id, 6))
        })
        .collect();
    let results: Vec<_> = buyers.into_iter().map(|b| b.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(OperationError::Conflict { .. }))));
    assert_eq!(engine.inventory().get(item.id).unwrap().data.quantity, 4);
}

#[test]
fn reducing_more_than_available_changes_nothing() {
    let engine = engine_with(Arc::new(NoDelay), Duration::from_secs(1));
    let item = engine
        .inventory()
        .create(InventoryItem::new("Book", 10))
        .unwrap();

    let err = engine.inventory().reduce_quantity(item.id, 100).unwrap_err();
    assert_eq!(
        err,
        OperationError::InsufficientQuantity {
            current: 10,
            requested: 100
        }
    );

    let stored = engine.inventory().get(item.id).unwrap();
    assert_eq!(stored.data.quantity, 10);
    assert_eq!(stored.version, item.version);
}

#[test]
fn retrying_callers_never_drive_quantity_negative() {
    let engine = engine_with(Arc::new(NoDelay), Duration::from_secs(1));
    let item = engine
        .inventory()
        .create(InventoryItem::new("AirPods Pro", 20))
        .unwrap();

    let id = item.id;
    let buyers: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            thread::spawn(move || {
                let mut bought: i64 = 0;
                loop {
                    match engine.inventory().reduce_quantity(id, 3) {
                        Ok(_) => bought += 1,
                        // Retry is the caller's decision.
                        Err(OperationError::Conflict { .. }) => continue,
                        Err(OperationError::InsufficientQuantity { .. }) => return bought,
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            })
        })
        .collect();
    let bought: i64 = buyers.into_iter().map(|b| b.join().unwrap()).sum();

    let stored = engine.inventory().get(item.id).unwrap();
    assert_eq!(bought, 6);
    assert_eq!(stored.data.quantity, 2);
    assert_eq!(stored.version, item.version + 6);
}

#[test]
fn explicit_two_phase_race_on_the_controller() {
    let engine = engine_with(Arc::new(NoDelay), Duration::from_secs(1));
    let item = engine
        .inventory()
        .create(InventoryItem::new("Book", 10))
        .unwrap();
    let occ = OptimisticController::new(engine.store().clone());

    let first = occ.read::<InventoryItem>(item.id).unwrap();
    let second = occ.read::<InventoryItem>(item.id).unwrap();
    assert_eq!(first.version, second.version);

    occ.commit(&second, &InventoryItem::new("Book", 9)).unwrap();
    let err = occ.commit(&first, &InventoryItem::new("Book", 9)).unwrap_err();
    assert!(matches!(err, OperationError::Conflict { .. }));

    let stored = engine.store().get::<InventoryItem>(item.id).unwrap();
    assert_eq!((stored.data.quantity, stored.version), (9, 2));
}
