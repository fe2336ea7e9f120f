//! In-memory store
//!
//! Intended for tests and local development. A unit of work holds the store
//! lock for its whole lifetime and edits a private copy of the state; commit
//! publishes the copy. Calls are therefore fully serialized.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    sort_fifo, Batch, BatchState, Consumption, ConsumptionStatus, Item, ItemSupplier, LineFilter,
    LineKey, NewBatch, NewConsumption, NewReceipt, NewStockLine, Receipt, ReceiptStatus, Recipe,
    RecipeLine, StockLine, Warehouse,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{InventoryStore, UnitOfWork};
use crate::error::AppResult;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i64,
    items: BTreeMap<i64, Item>,
    warehouses: BTreeMap<i64, Warehouse>,
    item_suppliers: BTreeMap<i64, ItemSupplier>,
    recipes: BTreeMap<i64, Recipe>,
    lines: BTreeMap<i64, StockLine>,
    batches: BTreeMap<i64, Batch>,
    receipts: BTreeMap<i64, Receipt>,
    consumptions: BTreeMap<i64, Consumption>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn stocked_lines(&self, filter: LineFilter) -> Vec<StockLine> {
        let mut lines: Vec<StockLine> = self
            .lines
            .values()
            .filter(|l| l.quantity > Decimal::ZERO && filter.matches(l))
            .cloned()
            .collect();
        sort_fifo(&mut lines);
        lines
    }
}

/// Process-local [`InventoryStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Master data seeding ──

    pub async fn add_item(&self, name: &str, unit_price: Option<Decimal>) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.items.insert(
            id,
            Item {
                id,
                code: None,
                name: name.to_string(),
                class_id: None,
                unit_id: None,
                unit_price,
            },
        );
        id
    }

    pub async fn add_warehouse(&self, name: &str) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.warehouses.insert(
            id,
            Warehouse {
                id,
                name: name.to_string(),
                location: None,
            },
        );
        id
    }

    pub async fn add_item_supplier(
        &self,
        item_id: i64,
        supplier_id: i64,
        unit_price: Option<Decimal>,
    ) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.item_suppliers.insert(
            id,
            ItemSupplier {
                id,
                item_id,
                supplier_id,
                unit_price,
            },
        );
        id
    }

    /// Register a recipe from `(item_id, proportion)` pairs in position order
    pub async fn add_recipe(&self, name: &str, lines: &[(i64, Decimal)]) -> i64 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let lines = lines
            .iter()
            .enumerate()
            .map(|(i, (item_id, proportion))| RecipeLine {
                position: i as i32 + 1,
                item_id: *item_id,
                proportion: *proportion,
                measure: None,
            })
            .collect();
        state.recipes.insert(
            id,
            Recipe {
                id,
                name: name.to_string(),
                lines,
            },
        );
        id
    }

    // ── Inspection ──

    pub async fn line(&self, id: i64) -> Option<StockLine> {
        self.state.lock().await.lines.get(&id).cloned()
    }

    pub async fn lines(&self) -> Vec<StockLine> {
        self.state.lock().await.lines.values().cloned().collect()
    }

    pub async fn batch(&self, id: i64) -> Option<Batch> {
        self.state.lock().await.batches.get(&id).cloned()
    }

    pub async fn batches(&self) -> Vec<Batch> {
        self.state.lock().await.batches.values().cloned().collect()
    }

    pub async fn receipts(&self) -> Vec<Receipt> {
        self.state.lock().await.receipts.values().cloned().collect()
    }

    pub async fn consumptions(&self) -> Vec<Consumption> {
        self.state.lock().await.consumptions.values().cloned().collect()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> AppResult<MemoryUnitOfWork> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(MemoryUnitOfWork { guard, working })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Unit of work over a private copy of the store state
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn item(&mut self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn warehouse(&mut self, id: i64) -> AppResult<Option<Warehouse>> {
        Ok(self.working.warehouses.get(&id).cloned())
    }

    async fn item_supplier(&mut self, id: i64) -> AppResult<Option<ItemSupplier>> {
        Ok(self.working.item_suppliers.get(&id).cloned())
    }

    async fn recipe(&mut self, id: i64) -> AppResult<Option<Recipe>> {
        Ok(self.working.recipes.get(&id).cloned())
    }

    async fn lock_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>> {
        Ok(self.working.stocked_lines(filter))
    }

    async fn list_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>> {
        Ok(self.working.stocked_lines(filter))
    }

    async fn lock_line(&mut self, id: i64) -> AppResult<Option<StockLine>> {
        Ok(self.working.lines.get(&id).cloned())
    }

    async fn lock_line_by_key(&mut self, key: LineKey) -> AppResult<Option<StockLine>> {
        let mut matching: Vec<StockLine> = self
            .working
            .lines
            .values()
            .filter(|l| l.key() == key)
            .cloned()
            .collect();
        sort_fifo(&mut matching);
        Ok(matching.into_iter().next())
    }

    async fn insert_line(&mut self, line: NewStockLine) -> AppResult<StockLine> {
        let id = self.working.next_id();
        let line = StockLine {
            id,
            item_id: line.item_id,
            batch_id: line.batch_id,
            warehouse_id: line.warehouse_id,
            quantity: line.quantity,
            entered_at: line.entered_at,
            exited_at: None,
        };
        self.working.lines.insert(id, line.clone());
        Ok(line)
    }

    async fn update_line(&mut self, line: &StockLine) -> AppResult<()> {
        self.working.lines.insert(line.id, line.clone());
        Ok(())
    }

    async fn low_stock_lines(&mut self, max: Decimal) -> AppResult<Vec<StockLine>> {
        let mut lines: Vec<StockLine> = self
            .working
            .lines
            .values()
            .filter(|l| l.quantity > Decimal::ZERO && l.quantity <= max)
            .cloned()
            .collect();
        lines.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.id.cmp(&b.id)));
        Ok(lines)
    }

    async fn get_batch(&mut self, id: i64) -> AppResult<Option<Batch>> {
        Ok(self.working.batches.get(&id).cloned())
    }

    async fn lock_batch(&mut self, id: i64) -> AppResult<Option<Batch>> {
        Ok(self.working.batches.get(&id).cloned())
    }

    async fn insert_batch(&mut self, batch: NewBatch) -> AppResult<Batch> {
        let id = self.working.next_id();
        let batch = Batch {
            id,
            item_id: batch.item_id,
            number: batch.number,
            location: batch.location,
            initial_quantity: batch.initial_quantity,
            remaining_quantity: batch.initial_quantity,
            expiration_date: batch.expiration_date,
            total_price: batch.total_price,
            state: BatchState::Active,
            created_at: Utc::now(),
        };
        self.working.batches.insert(id, batch.clone());
        Ok(batch)
    }

    async fn update_batch(&mut self, batch: &Batch) -> AppResult<()> {
        self.working.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn stocked_batches_expiring_by(&mut self, until: NaiveDate) -> AppResult<Vec<Batch>> {
        let mut batches: Vec<Batch> = self
            .working
            .batches
            .values()
            .filter(|b| {
                b.remaining_quantity > Decimal::ZERO
                    && b.expiration_date.is_some_and(|exp| exp <= until)
            })
            .cloned()
            .collect();
        batches.sort_by(|a, b| {
            a.expiration_date
                .cmp(&b.expiration_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(batches)
    }

    async fn active_batches(&mut self) -> AppResult<Vec<Batch>> {
        let mut batches: Vec<Batch> = self
            .working
            .batches
            .values()
            .filter(|b| b.state == BatchState::Active && b.remaining_quantity > Decimal::ZERO)
            .cloned()
            .collect();
        batches.sort_by(|a, b| match (a.expiration_date, b.expiration_date) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.id.cmp(&b.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(batches)
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> AppResult<Receipt> {
        let id = self.working.next_id();
        let total_price = receipt.total_price();
        let receipt = Receipt {
            id,
            item_id: receipt.item_id,
            item_supplier_id: receipt.item_supplier_id,
            batch_id: receipt.batch_id,
            warehouse_id: receipt.warehouse_id,
            quantity: receipt.quantity,
            unit_price: receipt.unit_price,
            total_price,
            received_on: receipt.received_on,
            delivery_note: receipt.delivery_note,
            purchase_order: receipt.purchase_order,
            status: ReceiptStatus::default(),
            created_at: Utc::now(),
        };
        self.working.receipts.insert(id, receipt.clone());
        Ok(receipt)
    }

    async fn insert_consumption(
        &mut self,
        consumption: NewConsumption,
    ) -> AppResult<Consumption> {
        let id = self.working.next_id();
        let consumption = Consumption {
            id,
            item_id: consumption.item_id,
            batch_id: consumption.batch_id,
            area: consumption.area,
            consumed_on: consumption.consumed_on,
            quantity: consumption.quantity,
            status: consumption.status,
            created_at: Utc::now(),
        };
        self.working.consumptions.insert(id, consumption.clone());
        Ok(consumption)
    }

    async fn set_receipt_status(
        &mut self,
        id: i64,
        status: ReceiptStatus,
    ) -> AppResult<Option<Receipt>> {
        Ok(self.working.receipts.get_mut(&id).map(|r| {
            r.status = status;
            r.clone()
        }))
    }

    async fn set_consumption_status(
        &mut self,
        id: i64,
        status: ConsumptionStatus,
    ) -> AppResult<Option<Consumption>> {
        Ok(self.working.consumptions.get_mut(&id).map(|c| {
            c.status = status;
            c.clone()
        }))
    }

    async fn commit(self) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
