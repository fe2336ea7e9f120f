//! Shared fixtures for the ledger integration tests

#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use inventory_ledger_backend::config::LedgerConfig;
use inventory_ledger_backend::services::journal::{
    BatchSelector, CreateConsumptionInput, CreateReceiptInput, NewBatchSpec, ReceiptResult,
};
use inventory_ledger_backend::services::{MovementJournal, StockQuery};
use inventory_ledger_backend::{AppResult, MemoryStore};
use rust_decimal::Decimal;
use shared::StockLevelPolicy;

// Helper to create Decimal from string
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Midnight UTC `n` days after 2024-01-01
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub fn journal(store: &MemoryStore) -> MovementJournal<MemoryStore> {
    MovementJournal::new(store.clone(), LedgerConfig::default())
}

pub fn stock_query(store: &MemoryStore) -> StockQuery<MemoryStore> {
    StockQuery::new(store.clone(), StockLevelPolicy::default())
}

pub async fn available(store: &MemoryStore, item_id: i64) -> Decimal {
    stock_query(store)
        .available(item_id, None, None)
        .await
        .unwrap()
        .available
}

pub fn receipt_input(
    item_id: i64,
    quantity: &str,
    batch: BatchSelector,
    warehouse_id: Option<i64>,
    received_day: i64,
) -> CreateReceiptInput {
    CreateReceiptInput {
        item_id,
        quantity: dec(quantity),
        unit_price: None,
        batch,
        warehouse_id,
        item_supplier_id: None,
        received_at: Some(day(received_day)),
        delivery_note: None,
        purchase_order: None,
    }
}

pub fn new_batch(number: &str) -> BatchSelector {
    BatchSelector::New(NewBatchSpec {
        number: Some(number.to_string()),
        ..Default::default()
    })
}

pub async fn receive(
    store: &MemoryStore,
    item_id: i64,
    quantity: &str,
    batch: BatchSelector,
    warehouse_id: Option<i64>,
    received_day: i64,
) -> ReceiptResult {
    journal(store)
        .record_receipt(receipt_input(item_id, quantity, batch, warehouse_id, received_day))
        .await
        .unwrap()
}

pub fn consumption_input(item_id: i64, quantity: &str) -> CreateConsumptionInput {
    CreateConsumptionInput {
        item_id,
        quantity: dec(quantity),
        area: "COCINA".to_string(),
        batch_id: None,
        warehouse_id: None,
        consumed_on: None,
    }
}

pub async fn consume(
    store: &MemoryStore,
    item_id: i64,
    quantity: &str,
) -> AppResult<inventory_ledger_backend::services::journal::ConsumptionResult> {
    journal(store)
        .record_consumption(consumption_input(item_id, quantity))
        .await
}

/// Batch L split over two warehouses: line X holds 5 (day 1), line Y holds 3 (day 2)
pub struct SplitBatch {
    pub store: MemoryStore,
    pub item_id: i64,
    pub warehouse_x: i64,
    pub warehouse_y: i64,
    pub batch_id: i64,
    pub line_x: i64,
    pub line_y: i64,
}

pub async fn split_batch() -> SplitBatch {
    let store = MemoryStore::new();
    let item_id = store.add_item("Harina", Some(dec("2.50"))).await;
    let warehouse_x = store.add_warehouse("Central").await;
    let warehouse_y = store.add_warehouse("Cocina").await;

    let first = receive(&store, item_id, "5", new_batch("L"), Some(warehouse_x), 1).await;
    let batch_id = first.batch.as_ref().unwrap().id;
    let second = receive(
        &store,
        item_id,
        "3",
        BatchSelector::Existing { batch_id },
        Some(warehouse_y),
        2,
    )
    .await;

    SplitBatch {
        store,
        item_id,
        warehouse_x,
        warehouse_y,
        batch_id,
        line_x: first.line.id,
        line_y: second.line.id,
    }
}
