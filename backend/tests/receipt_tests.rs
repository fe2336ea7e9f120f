//! Receipt recording tests

mod common;

use common::*;
use inventory_ledger_backend::services::journal::{BatchSelector, CreateReceiptInput, NewBatchSpec};
use inventory_ledger_backend::{AppError, MemoryStore};
use shared::{BatchState, ReceiptStatus};

#[tokio::test]
async fn test_receipt_into_new_batch() {
    let store = MemoryStore::new();
    let item = store.add_item("Leche", None).await;
    let warehouse = store.add_warehouse("Frio").await;

    let input = CreateReceiptInput {
        unit_price: Some(dec("1.50")),
        delivery_note: Some("GR-0001".to_string()),
        ..receipt_input(item, "12", new_batch("LCH-01"), Some(warehouse), 4)
    };
    let result = journal(&store).record_receipt(input).await.unwrap();

    let batch = result.batch.unwrap();
    assert_eq!(batch.number.as_deref(), Some("LCH-01"));
    assert_eq!(batch.initial_quantity, dec("12"));
    assert_eq!(batch.remaining_quantity, dec("12"));
    assert_eq!(batch.total_price, Some(dec("18")));
    assert_eq!(batch.state, BatchState::Active);

    assert_eq!(result.line.batch_id, Some(batch.id));
    assert_eq!(result.line.warehouse_id, Some(warehouse));
    assert_eq!(result.line.quantity, dec("12"));
    assert_eq!(result.line.entered_at, day(4));

    let receipt = result.receipt;
    assert_eq!(receipt.status, ReceiptStatus::Received);
    assert_eq!(receipt.batch_id, Some(batch.id));
    assert_eq!(receipt.total_price, Some(dec("18")));
    assert_eq!(receipt.received_on, day(4).date_naive());

    assert_eq!(available(&store, item).await, dec("12"));
}

#[tokio::test]
async fn test_new_batch_carries_expiration_and_explicit_price() {
    let store = MemoryStore::new();
    let item = store.add_item("Yogur", None).await;
    let expiration = day(40).date_naive();

    let selector = BatchSelector::New(NewBatchSpec {
        number: Some("Y-7".to_string()),
        location: Some("Rack 3".to_string()),
        expiration_date: Some(expiration),
        total_price: Some(dec("99.90")),
    });
    let input = CreateReceiptInput {
        unit_price: Some(dec("5")),
        ..receipt_input(item, "10", selector, None, 0)
    };
    let batch = journal(&store)
        .record_receipt(input)
        .await
        .unwrap()
        .batch
        .unwrap();

    assert_eq!(batch.expiration_date, Some(expiration));
    assert_eq!(batch.location.as_deref(), Some("Rack 3"));
    assert_eq!(batch.total_price, Some(dec("99.90")));
}

#[tokio::test]
async fn test_receipt_tops_up_existing_line() {
    let f = split_batch().await;

    let result = receive(
        &f.store,
        f.item_id,
        "4",
        BatchSelector::Existing {
            batch_id: f.batch_id,
        },
        Some(f.warehouse_x),
        9,
    )
    .await;

    assert_eq!(result.line.id, f.line_x);
    assert_eq!(result.line.quantity, dec("9"));
    // the line keeps its place in the FIFO queue
    assert_eq!(result.line.entered_at, day(1));

    let batch = result.batch.unwrap();
    assert_eq!(batch.initial_quantity, dec("12"));
    assert_eq!(batch.remaining_quantity, dec("12"));
    assert_eq!(f.store.lines().await.len(), 2);
}

#[tokio::test]
async fn test_refilled_line_keeps_exit_time() {
    let f = split_batch().await;
    consume(&f.store, f.item_id, "5").await.unwrap();
    let drained = f.store.line(f.line_x).await.unwrap();
    assert!(drained.exited_at.is_some());

    let result = receive(
        &f.store,
        f.item_id,
        "2",
        BatchSelector::Existing {
            batch_id: f.batch_id,
        },
        Some(f.warehouse_x),
        5,
    )
    .await;

    assert_eq!(result.line.id, f.line_x);
    assert_eq!(result.line.quantity, dec("2"));
    assert_eq!(result.line.exited_at, drained.exited_at);
}

#[tokio::test]
async fn test_receipt_into_exhausted_batch_keeps_it_exhausted() {
    let f = split_batch().await;
    consume(&f.store, f.item_id, "8").await.unwrap();

    let result = receive(
        &f.store,
        f.item_id,
        "3",
        BatchSelector::Existing {
            batch_id: f.batch_id,
        },
        Some(f.warehouse_y),
        6,
    )
    .await;

    let batch = result.batch.unwrap();
    assert_eq!(batch.state, BatchState::Exhausted);
    assert_eq!(batch.remaining_quantity, dec("3"));
    assert_eq!(available(&f.store, f.item_id).await, dec("3"));
}

#[tokio::test]
async fn test_loose_receipts_share_one_line() {
    let store = MemoryStore::new();
    let item = store.add_item("Agua", None).await;

    let first = receive(&store, item, "1", BatchSelector::None, None, 0).await;
    let second = receive(&store, item, "2", BatchSelector::None, None, 1).await;

    assert!(first.batch.is_none());
    assert_eq!(first.line.id, second.line.id);
    assert_eq!(second.line.quantity, dec("3"));
    assert_eq!(store.receipts().await.len(), 2);
}

#[tokio::test]
async fn test_existing_batch_of_other_item_is_rejected() {
    let f = split_batch().await;
    let other_item = f.store.add_item("Aceite", None).await;

    let input = receipt_input(
        other_item,
        "1",
        BatchSelector::Existing {
            batch_id: f.batch_id,
        },
        Some(f.warehouse_x),
        3,
    );
    let err = journal(&f.store).record_receipt(input).await.unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "batch_id"));
    assert_eq!(
        f.store.batch(f.batch_id).await.unwrap().remaining_quantity,
        dec("8")
    );
    assert_eq!(f.store.receipts().await.len(), 2);
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let f = split_batch().await;

    let cases = vec![
        receipt_input(9999, "1", BatchSelector::None, None, 0),
        receipt_input(f.item_id, "1", BatchSelector::None, Some(9999), 0),
        receipt_input(
            f.item_id,
            "1",
            BatchSelector::Existing { batch_id: 9999 },
            None,
            0,
        ),
        CreateReceiptInput {
            item_supplier_id: Some(9999),
            ..receipt_input(f.item_id, "1", BatchSelector::None, None, 0)
        },
    ];

    for input in cases {
        let err = journal(&f.store).record_receipt(input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "unexpected {:?}", err);
    }
    assert_eq!(available(&f.store, f.item_id).await, dec("8"));
}

#[tokio::test]
async fn test_non_positive_receipt_is_rejected() {
    let f = split_batch().await;

    let err = journal(&f.store)
        .record_receipt(receipt_input(f.item_id, "0", new_batch("Z"), None, 0))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidQuantity { .. }));
    assert_eq!(f.store.batches().await.len(), 1);
}

#[tokio::test]
async fn test_receipt_status_change_leaves_stock_alone() {
    let f = split_batch().await;
    let receipt_id = f.store.receipts().await[0].id;

    let updated = journal(&f.store)
        .set_receipt_status(receipt_id, ReceiptStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, ReceiptStatus::Cancelled);
    assert_eq!(available(&f.store, f.item_id).await, dec("8"));

    let err = journal(&f.store)
        .set_receipt_status(9999, ReceiptStatus::Partial)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_receipt_price_is_rounded_to_stored_precision() {
    let store = MemoryStore::new();
    let item = store.add_item("Cafe", None).await;

    let input = CreateReceiptInput {
        unit_price: Some(dec("0.3333")),
        ..receipt_input(item, "1.5", new_batch("C-1"), None, 0)
    };
    let result = journal(&store).record_receipt(input).await.unwrap();

    // 0.49995 rounds half away from zero
    assert_eq!(result.receipt.total_price, Some(dec("0.5")));
    assert_eq!(result.batch.unwrap().total_price, Some(dec("0.5")));

    let input = CreateReceiptInput {
        unit_price: Some(dec("-1")),
        ..receipt_input(item, "1", BatchSelector::None, None, 0)
    };
    let err = journal(&store).record_receipt(input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "unit_price"));

    let err = journal(&store)
        .record_receipt(receipt_input(item, "0.00001", BatchSelector::None, None, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity { ref field, .. } if field == "quantity"));
    assert_eq!(store.receipts().await.len(), 1);
}
