//! FIFO allocation and consumption tests
//!
//! Covers draining order, batch exhaustion and the all-or-nothing behaviour
//! of a failed allocation.

mod common;

use common::*;
use inventory_ledger_backend::services::journal::{BatchSelector, CreateConsumptionInput};
use inventory_ledger_backend::{AppError, MemoryStore};
use rust_decimal::Decimal;
use shared::{BatchState, ConsumptionStatus};

#[tokio::test]
async fn test_consumption_drains_oldest_line_first() {
    let f = split_batch().await;

    let result = consume(&f.store, f.item_id, "6").await.unwrap();

    assert_eq!(result.draws.len(), 2);
    assert_eq!(result.draws[0].line_id, f.line_x);
    assert_eq!(result.draws[0].taken, dec("5"));
    assert_eq!(result.draws[1].line_id, f.line_y);
    assert_eq!(result.draws[1].taken, dec("1"));

    let x = f.store.line(f.line_x).await.unwrap();
    assert_eq!(x.quantity, Decimal::ZERO);
    assert!(x.exited_at.is_some());

    let y = f.store.line(f.line_y).await.unwrap();
    assert_eq!(y.quantity, dec("2"));
    assert!(y.exited_at.is_none());

    let batch = f.store.batch(f.batch_id).await.unwrap();
    assert_eq!(batch.remaining_quantity, dec("2"));
    assert_eq!(batch.state, BatchState::Active);

    let consumption = &result.consumption;
    assert_eq!(consumption.quantity, dec("6"));
    assert_eq!(consumption.status, ConsumptionStatus::Confirmed);
    assert_eq!(consumption.batch_id, None);
}

#[tokio::test]
async fn test_insufficient_stock_changes_nothing() {
    let f = split_batch().await;
    let lines_before = f.store.lines().await;

    let err = consume(&f.store, f.item_id, "10").await.unwrap_err();

    match err {
        AppError::InsufficientStock {
            item_id,
            available,
            requested,
        } => {
            assert_eq!(item_id, f.item_id);
            assert_eq!(available, dec("8"));
            assert_eq!(requested, dec("10"));
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(f.store.lines().await, lines_before);
    assert_eq!(
        f.store.batch(f.batch_id).await.unwrap().remaining_quantity,
        dec("8")
    );
    assert!(f.store.consumptions().await.is_empty());
}

#[tokio::test]
async fn test_consuming_last_units_exhausts_batch() {
    let f = split_batch().await;
    consume(&f.store, f.item_id, "6").await.unwrap();

    consume(&f.store, f.item_id, "2").await.unwrap();

    let batch = f.store.batch(f.batch_id).await.unwrap();
    assert_eq!(batch.remaining_quantity, Decimal::ZERO);
    assert_eq!(batch.state, BatchState::Exhausted);
    assert_eq!(available(&f.store, f.item_id).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_consumption_limited_to_warehouse() {
    let f = split_batch().await;

    let input = CreateConsumptionInput {
        warehouse_id: Some(f.warehouse_y),
        ..consumption_input(f.item_id, "3")
    };
    let result = journal(&f.store).record_consumption(input).await.unwrap();

    assert_eq!(result.draws.len(), 1);
    assert_eq!(result.draws[0].line_id, f.line_y);
    assert_eq!(f.store.line(f.line_x).await.unwrap().quantity, dec("5"));

    let input = CreateConsumptionInput {
        warehouse_id: Some(f.warehouse_y),
        ..consumption_input(f.item_id, "1")
    };
    let err = journal(&f.store).record_consumption(input).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
}

#[tokio::test]
async fn test_consumption_targeting_batch_records_it() {
    let f = split_batch().await;
    let other = receive(&f.store, f.item_id, "50", new_batch("M"), Some(f.warehouse_x), 0).await;
    let other_batch = other.batch.unwrap().id;

    let input = CreateConsumptionInput {
        batch_id: Some(f.batch_id),
        ..consumption_input(f.item_id, "4")
    };
    let result = journal(&f.store).record_consumption(input).await.unwrap();

    assert_eq!(result.consumption.batch_id, Some(f.batch_id));
    assert!(result.draws.iter().all(|d| d.batch_id == Some(f.batch_id)));
    assert_eq!(
        f.store.batch(other_batch).await.unwrap().remaining_quantity,
        dec("50")
    );
    assert_eq!(
        f.store.batch(f.batch_id).await.unwrap().remaining_quantity,
        dec("4")
    );
}

#[tokio::test]
async fn test_loose_stock_without_batch_is_allocated() {
    let store = MemoryStore::new();
    let item = store.add_item("Sal", None).await;
    receive(&store, item, "2.5", BatchSelector::None, None, 3).await;

    let result = consume(&store, item, "2.5").await.unwrap();
    assert_eq!(result.draws.len(), 1);
    assert_eq!(result.draws[0].batch_id, None);
    assert_eq!(available(&store, item).await, Decimal::ZERO);
    assert!(store.batches().await.is_empty());
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() {
    let f = split_batch().await;

    for quantity in ["0", "-1"] {
        let err = consume(&f.store, f.item_id, quantity).await.unwrap_err();
        assert!(
            matches!(err, AppError::InvalidQuantity { ref field, .. } if field == "quantity"),
            "unexpected error {:?}",
            err
        );
    }
    assert_eq!(available(&f.store, f.item_id).await, dec("8"));
}

#[tokio::test]
async fn test_unknown_item_or_batch_is_not_found() {
    let f = split_batch().await;

    let err = consume(&f.store, 9999, "1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let input = CreateConsumptionInput {
        batch_id: Some(9999),
        ..consumption_input(f.item_id, "1")
    };
    let err = journal(&f.store).record_consumption(input).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_blank_area_is_rejected() {
    let f = split_batch().await;

    let input = CreateConsumptionInput {
        area: "   ".to_string(),
        ..consumption_input(f.item_id, "1")
    };
    let err = journal(&f.store).record_consumption(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "area"));
}

#[tokio::test]
async fn test_consumption_status_change_leaves_stock_alone() {
    let f = split_batch().await;
    let result = consume(&f.store, f.item_id, "3").await.unwrap();

    let updated = journal(&f.store)
        .set_consumption_status(result.consumption.id, ConsumptionStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, ConsumptionStatus::Cancelled);
    assert_eq!(available(&f.store, f.item_id).await, dec("5"));

    let err = journal(&f.store)
        .set_consumption_status(9999, ConsumptionStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_quantity_beyond_stored_precision_is_rejected() {
    let f = split_batch().await;

    let err = consume(&f.store, f.item_id, "1.00005").await.unwrap_err();
    match err {
        AppError::InvalidQuantity { field, value } => {
            assert_eq!(field, "quantity");
            assert_eq!(value, dec("1.00005"));
        }
        other => panic!("expected InvalidQuantity, got {:?}", other),
    }
    assert_eq!(available(&f.store, f.item_id).await, dec("8"));

    // trailing zeros past the fourth place are fine
    consume(&f.store, f.item_id, "1.250000").await.unwrap();
    assert_eq!(available(&f.store, f.item_id).await, dec("6.75"));
}

#[tokio::test]
async fn test_batch_of_another_item_is_rejected() {
    let f = split_batch().await;
    let sugar = f.store.add_item("Azucar", None).await;
    receive(&f.store, sugar, "4", new_batch("S"), Some(f.warehouse_x), 1).await;

    let input = CreateConsumptionInput {
        batch_id: Some(f.batch_id),
        ..consumption_input(sugar, "1")
    };
    let err = journal(&f.store).record_consumption(input).await.unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "batch_id"));
    assert_eq!(available(&f.store, sugar).await, dec("4"));
    assert_eq!(available(&f.store, f.item_id).await, dec("8"));
    assert!(f.store.consumptions().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consumptions_never_oversell() {
    let store = MemoryStore::new();
    let item = store.add_item("Aceite", None).await;
    let warehouse = store.add_warehouse("Central").await;
    receive(&store, item, "3", new_batch("A"), Some(warehouse), 1).await;
    receive(&store, item, "3", new_batch("B"), Some(warehouse), 2).await;
    receive(&store, item, "2", new_batch("C"), Some(warehouse), 3).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { consume(&store, item, "3").await })
        })
        .collect();

    let mut succeeded = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientStock { .. }) => short += 1,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(short, 6);
    assert_eq!(available(&store, item).await, dec("2"));
    assert_eq!(store.consumptions().await.len(), 2);

    let remaining: Decimal = store
        .batches()
        .await
        .iter()
        .map(|b| b.remaining_quantity)
        .sum();
    assert_eq!(remaining, dec("2"));
    assert!(store.lines().await.iter().all(|l| l.quantity >= Decimal::ZERO));
}
