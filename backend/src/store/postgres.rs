//! PostgreSQL store
//!
//! One `sqlx` transaction per unit of work. Lines and batches read through
//! the `lock_*` methods are taken with `SELECT ... FOR UPDATE`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    Batch, BatchState, Consumption, ConsumptionStatus, Item, ItemSupplier, LineFilter, LineKey,
    NewBatch, NewConsumption, NewReceipt, NewStockLine, Receipt, ReceiptStatus, Recipe,
    RecipeLine, StockLine, Warehouse,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{InventoryStore, UnitOfWork};
use crate::error::{AppError, AppResult};

const LINE_COLUMNS: &str = "id, item_id, batch_id, warehouse_id, quantity, entered_at, exited_at";

const BATCH_COLUMNS: &str = "id, item_id, number, location, initial_quantity, remaining_quantity, \
     expiration_date, total_price, state, created_at";

const RECEIPT_COLUMNS: &str = "id, item_id, item_supplier_id, batch_id, warehouse_id, quantity, \
     unit_price, total_price, received_on, delivery_note, purchase_order, status, created_at";

const CONSUMPTION_COLUMNS: &str =
    "id, item_id, batch_id, area, consumed_on, quantity, status, created_at";

/// Pool-backed [`InventoryStore`]
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> AppResult<PgUnitOfWork> {
        let tx = self.db.begin().await?;
        Ok(PgUnitOfWork { tx })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

// ── Row types ──

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    code: Option<String>,
    name: String,
    class_id: Option<String>,
    unit_id: Option<String>,
    unit_price: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: i64,
    name: String,
    location: Option<String>,
}

#[derive(Debug, FromRow)]
struct ItemSupplierRow {
    id: i64,
    item_id: i64,
    supplier_id: i64,
    unit_price: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromRow)]
struct RecipeLineRow {
    position: i32,
    item_id: i64,
    proportion: Decimal,
    measure: Option<String>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: i64,
    item_id: i64,
    batch_id: Option<i64>,
    warehouse_id: Option<i64>,
    quantity: Decimal,
    entered_at: DateTime<Utc>,
    exited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: i64,
    item_id: i64,
    number: Option<String>,
    location: Option<String>,
    initial_quantity: Decimal,
    remaining_quantity: Decimal,
    expiration_date: Option<NaiveDate>,
    total_price: Option<Decimal>,
    state: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ReceiptRow {
    id: i64,
    item_id: i64,
    item_supplier_id: Option<i64>,
    batch_id: Option<i64>,
    warehouse_id: Option<i64>,
    quantity: Decimal,
    unit_price: Option<Decimal>,
    total_price: Option<Decimal>,
    received_on: NaiveDate,
    delivery_note: Option<String>,
    purchase_order: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ConsumptionRow {
    id: i64,
    item_id: i64,
    batch_id: Option<i64>,
    area: String,
    consumed_on: NaiveDate,
    quantity: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        Item {
            id: r.id,
            code: r.code,
            name: r.name,
            class_id: r.class_id,
            unit_id: r.unit_id,
            unit_price: r.unit_price,
        }
    }
}

impl From<LineRow> for StockLine {
    fn from(r: LineRow) -> Self {
        StockLine {
            id: r.id,
            item_id: r.item_id,
            batch_id: r.batch_id,
            warehouse_id: r.warehouse_id,
            quantity: r.quantity,
            entered_at: r.entered_at,
            exited_at: r.exited_at,
        }
    }
}

impl TryFrom<BatchRow> for Batch {
    type Error = AppError;

    fn try_from(r: BatchRow) -> AppResult<Self> {
        let state = BatchState::parse(&r.state)
            .ok_or_else(|| AppError::Internal(format!("Unknown batch state: {}", r.state)))?;
        Ok(Batch {
            id: r.id,
            item_id: r.item_id,
            number: r.number,
            location: r.location,
            initial_quantity: r.initial_quantity,
            remaining_quantity: r.remaining_quantity,
            expiration_date: r.expiration_date,
            total_price: r.total_price,
            state,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<ReceiptRow> for Receipt {
    type Error = AppError;

    fn try_from(r: ReceiptRow) -> AppResult<Self> {
        let status = ReceiptStatus::parse(&r.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown receipt status: {}", r.status)))?;
        Ok(Receipt {
            id: r.id,
            item_id: r.item_id,
            item_supplier_id: r.item_supplier_id,
            batch_id: r.batch_id,
            warehouse_id: r.warehouse_id,
            quantity: r.quantity,
            unit_price: r.unit_price,
            total_price: r.total_price,
            received_on: r.received_on,
            delivery_note: r.delivery_note,
            purchase_order: r.purchase_order,
            status,
            created_at: r.created_at,
        })
    }
}

impl TryFrom<ConsumptionRow> for Consumption {
    type Error = AppError;

    fn try_from(r: ConsumptionRow) -> AppResult<Self> {
        let status = ConsumptionStatus::parse(&r.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown consumption status: {}", r.status))
        })?;
        Ok(Consumption {
            id: r.id,
            item_id: r.item_id,
            batch_id: r.batch_id,
            area: r.area,
            consumed_on: r.consumed_on,
            quantity: r.quantity,
            status,
            created_at: r.created_at,
        })
    }
}

impl PgUnitOfWork {
    async fn fetch_lines(&mut self, filter: LineFilter, lock: bool) -> AppResult<Vec<StockLine>> {
        let sql = format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM stock_lines
            WHERE item_id = $1
              AND quantity > 0
              AND ($2::BIGINT IS NULL OR batch_id = $2)
              AND ($3::BIGINT IS NULL OR warehouse_id = $3)
            ORDER BY entered_at, id
            {}
            "#,
            if lock { "FOR UPDATE" } else { "" }
        );

        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(filter.item_id)
            .bind(filter.batch_id)
            .bind(filter.warehouse_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(StockLine::from).collect())
    }

    async fn fetch_batch(&mut self, id: i64, lock: bool) -> AppResult<Option<Batch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM batches WHERE id = $1 {}",
            if lock { "FOR UPDATE" } else { "" }
        );

        sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Batch::try_from)
            .transpose()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn item(&mut self, id: i64) -> AppResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, code, name, class_id, unit_id, unit_price FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Item::from))
    }

    async fn warehouse(&mut self, id: i64) -> AppResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            "SELECT id, name, location FROM warehouses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|r| Warehouse {
            id: r.id,
            name: r.name,
            location: r.location,
        }))
    }

    async fn item_supplier(&mut self, id: i64) -> AppResult<Option<ItemSupplier>> {
        let row = sqlx::query_as::<_, ItemSupplierRow>(
            "SELECT id, item_id, supplier_id, unit_price FROM item_suppliers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|r| ItemSupplier {
            id: r.id,
            item_id: r.item_id,
            supplier_id: r.supplier_id,
            unit_price: r.unit_price,
        }))
    }

    async fn recipe(&mut self, id: i64) -> AppResult<Option<Recipe>> {
        let recipe =
            sqlx::query_as::<_, RecipeRow>("SELECT id, name FROM recipes WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?;
        let Some(recipe) = recipe else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, RecipeLineRow>(
            r#"
            SELECT position, item_id, proportion, measure
            FROM recipe_lines
            WHERE recipe_id = $1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Some(Recipe {
            id: recipe.id,
            name: recipe.name,
            lines: lines
                .into_iter()
                .map(|l| RecipeLine {
                    position: l.position,
                    item_id: l.item_id,
                    proportion: l.proportion,
                    measure: l.measure,
                })
                .collect(),
        }))
    }

    async fn lock_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>> {
        self.fetch_lines(filter, true).await
    }

    async fn list_lines(&mut self, filter: LineFilter) -> AppResult<Vec<StockLine>> {
        self.fetch_lines(filter, false).await
    }

    async fn lock_line(&mut self, id: i64) -> AppResult<Option<StockLine>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM stock_lines WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, LineRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(StockLine::from))
    }

    async fn lock_line_by_key(&mut self, key: LineKey) -> AppResult<Option<StockLine>> {
        let sql = format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM stock_lines
            WHERE item_id = $1
              AND batch_id IS NOT DISTINCT FROM $2
              AND warehouse_id IS NOT DISTINCT FROM $3
            ORDER BY entered_at, id
            LIMIT 1
            FOR UPDATE
            "#
        );
        let row = sqlx::query_as::<_, LineRow>(&sql)
            .bind(key.item_id)
            .bind(key.batch_id)
            .bind(key.warehouse_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(StockLine::from))
    }

    async fn insert_line(&mut self, line: NewStockLine) -> AppResult<StockLine> {
        let sql = format!(
            r#"
            INSERT INTO stock_lines (item_id, batch_id, warehouse_id, quantity, entered_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LINE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, LineRow>(&sql)
            .bind(line.item_id)
            .bind(line.batch_id)
            .bind(line.warehouse_id)
            .bind(line.quantity)
            .bind(line.entered_at)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row.into())
    }

    async fn update_line(&mut self, line: &StockLine) -> AppResult<()> {
        sqlx::query("UPDATE stock_lines SET quantity = $2, exited_at = $3 WHERE id = $1")
            .bind(line.id)
            .bind(line.quantity)
            .bind(line.exited_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn low_stock_lines(&mut self, max: Decimal) -> AppResult<Vec<StockLine>> {
        let sql = format!(
            r#"
            SELECT {LINE_COLUMNS}
            FROM stock_lines
            WHERE quantity > 0 AND quantity <= $1
            ORDER BY quantity, id
            "#
        );
        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(max)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(rows.into_iter().map(StockLine::from).collect())
    }

    async fn get_batch(&mut self, id: i64) -> AppResult<Option<Batch>> {
        self.fetch_batch(id, false).await
    }

    async fn lock_batch(&mut self, id: i64) -> AppResult<Option<Batch>> {
        self.fetch_batch(id, true).await
    }

    async fn insert_batch(&mut self, batch: NewBatch) -> AppResult<Batch> {
        let sql = format!(
            r#"
            INSERT INTO batches (
                item_id, number, location, initial_quantity, remaining_quantity,
                expiration_date, total_price, state
            )
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7)
            RETURNING {BATCH_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(batch.item_id)
            .bind(&batch.number)
            .bind(&batch.location)
            .bind(batch.initial_quantity)
            .bind(batch.expiration_date)
            .bind(batch.total_price)
            .bind(BatchState::Active.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    async fn update_batch(&mut self, batch: &Batch) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE batches
            SET initial_quantity = $2, remaining_quantity = $3, state = $4
            WHERE id = $1
            "#,
        )
        .bind(batch.id)
        .bind(batch.initial_quantity)
        .bind(batch.remaining_quantity)
        .bind(batch.state.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn stocked_batches_expiring_by(&mut self, until: NaiveDate) -> AppResult<Vec<Batch>> {
        let sql = format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE remaining_quantity > 0
              AND expiration_date IS NOT NULL
              AND expiration_date <= $1
            ORDER BY expiration_date, id
            "#
        );
        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(until)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(Batch::try_from).collect()
    }

    async fn active_batches(&mut self) -> AppResult<Vec<Batch>> {
        let sql = format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches
            WHERE state = $1
              AND remaining_quantity > 0
            ORDER BY expiration_date NULLS LAST, id
            "#
        );
        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(BatchState::Active.as_str())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.into_iter().map(Batch::try_from).collect()
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> AppResult<Receipt> {
        let total_price = receipt.total_price();
        let sql = format!(
            r#"
            INSERT INTO receipts (
                item_id, item_supplier_id, batch_id, warehouse_id, quantity, unit_price,
                total_price, received_on, delivery_note, purchase_order, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {RECEIPT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(receipt.item_id)
            .bind(receipt.item_supplier_id)
            .bind(receipt.batch_id)
            .bind(receipt.warehouse_id)
            .bind(receipt.quantity)
            .bind(receipt.unit_price)
            .bind(total_price)
            .bind(receipt.received_on)
            .bind(&receipt.delivery_note)
            .bind(&receipt.purchase_order)
            .bind(ReceiptStatus::default().as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    async fn insert_consumption(
        &mut self,
        consumption: NewConsumption,
    ) -> AppResult<Consumption> {
        let sql = format!(
            r#"
            INSERT INTO consumptions (item_id, batch_id, area, consumed_on, quantity, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CONSUMPTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(consumption.item_id)
            .bind(consumption.batch_id)
            .bind(&consumption.area)
            .bind(consumption.consumed_on)
            .bind(consumption.quantity)
            .bind(consumption.status.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    async fn set_receipt_status(
        &mut self,
        id: i64,
        status: ReceiptStatus,
    ) -> AppResult<Option<Receipt>> {
        let sql = format!("UPDATE receipts SET status = $2 WHERE id = $1 RETURNING {RECEIPT_COLUMNS}");
        sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Receipt::try_from)
            .transpose()
    }

    async fn set_consumption_status(
        &mut self,
        id: i64,
        status: ConsumptionStatus,
    ) -> AppResult<Option<Consumption>> {
        let sql = format!(
            "UPDATE consumptions SET status = $2 WHERE id = $1 RETURNING {CONSUMPTION_COLUMNS}"
        );
        sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(Consumption::try_from)
            .transpose()
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
