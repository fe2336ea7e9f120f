//! Low-stock report tests

mod common;

use common::*;
use inventory_ledger_backend::services::journal::BatchSelector;
use inventory_ledger_backend::{AppError, MemoryStore};
use rust_decimal::Decimal;
use shared::StockLevel;

/// Four lines of two items: 2, 4.5, 9 and 25 units
async fn pantry() -> (MemoryStore, i64, i64) {
    let store = MemoryStore::new();
    let warehouse = store.add_warehouse("Central").await;
    let rice = store.add_item("Arroz", Some(dec("1.50"))).await;
    let salt = store.add_item("Sal", None).await;

    receive(&store, rice, "2", new_batch("R-1"), Some(warehouse), 1).await;
    receive(&store, rice, "9", new_batch("R-2"), Some(warehouse), 2).await;
    receive(&store, rice, "25", new_batch("R-3"), Some(warehouse), 3).await;
    receive(&store, salt, "4.5", BatchSelector::None, Some(warehouse), 1).await;
    (store, rice, salt)
}

#[tokio::test]
async fn test_low_stock_lines_are_graded() {
    let (store, rice, salt) = pantry().await;

    let report = stock_query(&store).low_stock(None).await.unwrap();

    assert_eq!(report.minimum, dec("10"));
    assert_eq!(report.total, 3);
    let quantities: Vec<Decimal> = report.lines.iter().map(|l| l.quantity).collect();
    assert_eq!(quantities, vec![dec("2"), dec("4.5"), dec("9")]);

    let levels: Vec<StockLevel> = report.lines.iter().map(|l| l.level).collect();
    assert_eq!(
        levels,
        vec![StockLevel::Critical, StockLevel::High, StockLevel::Medium]
    );
    assert_eq!(report.critical_count, 1);
    assert_eq!(report.high_count, 1);

    assert_eq!(report.lines[0].item_id, rice);
    assert_eq!(report.lines[0].item_name, "Arroz");
    assert_eq!(report.lines[0].value, Some(dec("3")));
    assert_eq!(report.lines[1].item_id, salt);
    assert_eq!(report.lines[1].value, None);
    assert_eq!(report.value_at_risk, dec("16.5"));
}

#[tokio::test]
async fn test_low_stock_minimum_and_empty_lines() {
    let (store, rice, _) = pantry().await;
    consume(&store, rice, "2").await.unwrap();

    let report = stock_query(&store).low_stock(Some(dec("5"))).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.lines[0].quantity, dec("4.5"));

    let err = stock_query(&store)
        .low_stock(Some(Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity { ref field, .. } if field == "minimum"));
}
