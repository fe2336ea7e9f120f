//! Persistence port for the ledger
//!
//! Services never talk to a database directly. Every call opens one
//! [`UnitOfWork`] from an [`InventoryStore`], does its reads and writes
//! through it and commits. Dropping a unit of work without committing rolls
//! everything back.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    Batch, Consumption, ConsumptionStatus, Item, ItemSupplier, LineFilter, LineKey, NewBatch,
    NewConsumption, NewReceipt, NewStockLine, Receipt, ReceiptStatus, Recipe, StockLine,
    Warehouse,
};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A backend able to open units of work
#[async_trait]
pub trait InventoryStore: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> AppResult<Self::Tx>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> AppResult<()>;
}

/// One transaction against the store.
///
/// Line and batch reads prefixed with `lock_` hold their rows until the unit
/// of work ends.
#[async_trait]
pub trait UnitOfWork: Send {
    // ── Master data (read-only) ──

    async fn item(&mut self, id: i64) -> AppResult<Option<Item>>;
    async fn warehouse(&mut self, id: i64) -> AppResult<Option<Warehouse>>;
    async fn item_supplier(&mut self, id: i64) -> AppResult<Option<ItemSupplier>>;
    async fn recipe(&mut self, id: i64) -> AppResult<Option<Recipe>>;

    // ── Stock lines ──

    /// Lines matching `filter` with stock, in FIFO order, locked
    async fn lock_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>>;
    /// Lines matching `filter` with stock, in FIFO order, without locking
    async fn list_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>>;
    async fn lock_line(&mut self, id: i64) -> AppResult<Option<StockLine>>;
    /// The oldest line with exactly this key, locked
    async fn lock_line_by_key(&mut self, key: LineKey) -> AppResult<Option<StockLine>>;
    async fn insert_line(&mut self, line: NewStockLine) -> AppResult<StockLine>;
    async fn update_line(&mut self, line: &StockLine) -> AppResult<()>;
    /// Lines of any item holding `0 < quantity <= max`, smallest first
    async fn low_stock_lines(&mut self, max: Decimal) -> AppResult<Vec<StockLine>>;

    // ── Batches ──

    async fn get_batch(&mut self, id: i64) -> AppResult<Option<Batch>>;
    async fn lock_batch(&mut self, id: i64) -> AppResult<Option<Batch>>;
    async fn insert_batch(&mut self, batch: NewBatch) -> AppResult<Batch>;
    async fn update_batch(&mut self, batch: &Batch) -> AppResult<()>;
    /// Batches with remaining stock expiring on or before `until`, ordered
    /// by expiration date then id
    async fn stocked_batches_expiring_by(&mut self, until: NaiveDate) -> AppResult<Vec<Batch>>;
    /// ACTIVE batches with remaining stock, ordered by expiration date
    /// (undated last) then id
    async fn active_batches(&mut self) -> AppResult<Vec<Batch>>;

    // ── Movements ──

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> AppResult<Receipt>;
    async fn insert_consumption(&mut self, consumption: NewConsumption)
        -> AppResult<Consumption>;
    async fn set_receipt_status(
        &mut self,
        id: i64,
        status: ReceiptStatus,
    ) -> AppResult<Option<Receipt>>;
    async fn set_consumption_status(
        &mut self,
        id: i64,
        status: ConsumptionStatus,
    ) -> AppResult<Option<Consumption>>;

    async fn commit(self) -> AppResult<()>;
}
