//! Movement journal: receipts, consumptions, transfers and status changes
//!
//! Each public call is one unit of work. Ledger effects are applied when a
//! movement is recorded; later status changes never touch stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    fits_quantity_scale, round_quantity, validate_area, validate_transfer_route, Batch,
    Consumption, ConsumptionStatus, Draw, LineKey, NewBatch, NewConsumption, NewReceipt, Receipt,
    ReceiptStatus, StockLine,
};
use validator::Validate;

use super::allocation::{self, AllocationRequest};
use super::{check_quantity, ledger, lot, retry_on_conflict};
use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, UnitOfWork};

/// Which batch a receipt goes into
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchSelector {
    /// Augment an existing batch of the same item
    Existing { batch_id: i64 },
    /// Open a new batch with the received quantity
    New(NewBatchSpec),
    /// Loose stock with no batch
    #[default]
    None,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBatchSpec {
    pub number: Option<String>,
    pub location: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    /// Defaults to `unit_price × quantity`
    pub total_price: Option<Decimal>,
}

/// Input for recording a receipt
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReceiptInput {
    pub item_id: i64,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub batch: BatchSelector,
    pub warehouse_id: Option<i64>,
    pub item_supplier_id: Option<i64>,
    /// Entry time of the stock; defaults to now
    pub received_at: Option<DateTime<Utc>>,
    #[validate(length(max = 50))]
    pub delivery_note: Option<String>,
    #[validate(length(max = 50))]
    pub purchase_order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptResult {
    pub receipt: Receipt,
    pub batch: Option<Batch>,
    pub line: StockLine,
}

/// Input for recording a consumption
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConsumptionInput {
    pub item_id: i64,
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub area: String,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub consumed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionResult {
    pub consumption: Consumption,
    pub draws: Vec<Draw>,
}

/// Input for registering a weighing against one batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WeighingInput {
    pub item_id: i64,
    pub batch_id: i64,
    pub gross_weight: Decimal,
    /// Quantity drawn from the batch
    pub net_weight: Decimal,
    /// Recorded as the consuming area; defaults to the configured area
    #[validate(length(min = 1, max = 50))]
    pub operator: Option<String>,
    pub weighed_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeighingResult {
    pub consumption: Consumption,
    pub draws: Vec<Draw>,
    pub gross_weight: Decimal,
    pub net_weight: Decimal,
    pub tare: Decimal,
    /// Stock left in the batch after the draw
    pub batch_remaining: Decimal,
}

/// Input for moving stock of one line to another warehouse
#[derive(Debug, Clone, Deserialize)]
pub struct TransferInput {
    pub line_id: i64,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub origin: StockLine,
    pub destination: StockLine,
    pub quantity: Decimal,
}

/// Movement journal service
#[derive(Clone)]
pub struct MovementJournal<S> {
    store: S,
    settings: LedgerConfig,
}

impl<S: InventoryStore> MovementJournal<S> {
    pub fn new(store: S, settings: LedgerConfig) -> Self {
        Self { store, settings }
    }

    /// Receive stock into a batch and warehouse
    pub async fn record_receipt(&self, input: CreateReceiptInput) -> AppResult<ReceiptResult> {
        retry_on_conflict(self.settings.conflict_retries, "record_receipt", move || {
            self.record_receipt_once(input.clone())
        })
        .await
    }

    async fn record_receipt_once(&self, input: CreateReceiptInput) -> AppResult<ReceiptResult> {
        check_quantity("quantity", input.quantity)?;
        if let Some(price) = input.unit_price {
            check_price("unit_price", price)?;
        }
        if let BatchSelector::New(NewBatchSpec {
            total_price: Some(price),
            ..
        }) = &input.batch
        {
            check_price("total_price", *price)?;
        }

        let mut tx = self.store.begin().await?;

        tx.item(input.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        if let Some(warehouse_id) = input.warehouse_id {
            tx.warehouse(warehouse_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;
        }
        if let Some(item_supplier_id) = input.item_supplier_id {
            tx.item_supplier(item_supplier_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Item supplier".to_string()))?;
        }

        let batch = match &input.batch {
            BatchSelector::Existing { batch_id } => {
                batch_of_item(&mut tx, *batch_id, input.item_id).await?;
                Some(lot::augment_batch(&mut tx, *batch_id, input.quantity).await?)
            }
            BatchSelector::New(spec) => {
                let total_price = spec
                    .total_price
                    .or_else(|| input.unit_price.map(|p| round_quantity(p * input.quantity)));
                let created = lot::create_batch(
                    &mut tx,
                    NewBatch {
                        item_id: input.item_id,
                        number: spec.number.clone(),
                        location: spec.location.clone(),
                        initial_quantity: input.quantity,
                        expiration_date: spec.expiration_date,
                        total_price,
                    },
                )
                .await?;
                Some(created)
            }
            BatchSelector::None => None,
        };

        let received_at = input.received_at.unwrap_or_else(Utc::now);
        let key = LineKey {
            item_id: input.item_id,
            batch_id: batch.as_ref().map(|b| b.id),
            warehouse_id: input.warehouse_id,
        };
        let line = ledger::increment_or_create(&mut tx, key, input.quantity, received_at).await?;

        let receipt = tx
            .insert_receipt(NewReceipt {
                item_id: input.item_id,
                item_supplier_id: input.item_supplier_id,
                batch_id: key.batch_id,
                warehouse_id: input.warehouse_id,
                quantity: input.quantity,
                unit_price: input.unit_price,
                received_on: received_at.date_naive(),
                delivery_note: input.delivery_note,
                purchase_order: input.purchase_order,
            })
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Receipt {} recorded: {} of item {} into line {}",
            receipt.id,
            receipt.quantity,
            receipt.item_id,
            line.id
        );

        Ok(ReceiptResult {
            receipt,
            batch,
            line,
        })
    }

    /// Consume stock FIFO and journal it
    pub async fn record_consumption(
        &self,
        input: CreateConsumptionInput,
    ) -> AppResult<ConsumptionResult> {
        retry_on_conflict(self.settings.conflict_retries, "record_consumption", move || {
            self.record_consumption_once(input.clone())
        })
        .await
    }

    async fn record_consumption_once(
        &self,
        input: CreateConsumptionInput,
    ) -> AppResult<ConsumptionResult> {
        check_quantity("quantity", input.quantity)?;
        validate_area(&input.area)
            .map_err(|msg| AppError::validation("area", msg, "Área inválida"))?;

        let mut tx = self.store.begin().await?;

        tx.item(input.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        if let Some(batch_id) = input.batch_id {
            batch_of_item(&mut tx, batch_id, input.item_id).await?;
        }
        if let Some(warehouse_id) = input.warehouse_id {
            tx.warehouse(warehouse_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;
        }

        let result = consume(
            &mut tx,
            AllocationRequest {
                item_id: input.item_id,
                quantity: input.quantity,
                batch_id: input.batch_id,
                warehouse_id: input.warehouse_id,
            },
            input.area.trim().to_string(),
            input.consumed_on.unwrap_or_else(|| Utc::now().date_naive()),
            ConsumptionStatus::default(),
        )
        .await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Draw the net weight of a weighing from one batch, journaled as a
    /// WEIGHED consumption
    pub async fn record_weighing(&self, input: WeighingInput) -> AppResult<WeighingResult> {
        retry_on_conflict(self.settings.conflict_retries, "record_weighing", move || {
            self.record_weighing_once(input.clone())
        })
        .await
    }

    async fn record_weighing_once(&self, input: WeighingInput) -> AppResult<WeighingResult> {
        check_quantity("net_weight", input.net_weight)?;
        check_quantity("gross_weight", input.gross_weight)?;
        if input.gross_weight < input.net_weight {
            return Err(AppError::validation(
                "gross_weight",
                "Gross weight cannot be less than net weight",
                "El peso bruto no puede ser menor que el peso neto",
            ));
        }
        let area = input
            .operator
            .as_deref()
            .map(str::trim)
            .unwrap_or(self.settings.default_area.as_str())
            .to_string();
        validate_area(&area)
            .map_err(|msg| AppError::validation("operator", msg, "Operador inválido"))?;

        let mut tx = self.store.begin().await?;

        tx.item(input.item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;
        batch_of_item(&mut tx, input.batch_id, input.item_id).await?;

        let result = consume(
            &mut tx,
            AllocationRequest {
                item_id: input.item_id,
                quantity: input.net_weight,
                batch_id: Some(input.batch_id),
                warehouse_id: None,
            },
            area,
            input.weighed_on.unwrap_or_else(|| Utc::now().date_naive()),
            ConsumptionStatus::Weighed,
        )
        .await?;

        let batch_remaining = tx
            .get_batch(input.batch_id)
            .await?
            .map(|b| b.remaining_quantity)
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        tx.commit().await?;

        tracing::info!(
            "Weighing recorded on batch {}: net {} of gross {}, {} left",
            input.batch_id,
            input.net_weight,
            input.gross_weight,
            batch_remaining
        );

        Ok(WeighingResult {
            consumption: result.consumption,
            draws: result.draws,
            gross_weight: input.gross_weight,
            net_weight: input.net_weight,
            tare: input.gross_weight - input.net_weight,
            batch_remaining,
        })
    }

    /// Move `quantity` of one line from `origin_id` to `dest_id`
    pub async fn transfer_stock(
        &self,
        origin_id: i64,
        dest_id: i64,
        input: TransferInput,
    ) -> AppResult<TransferResult> {
        retry_on_conflict(self.settings.conflict_retries, "transfer_stock", move || {
            self.transfer_stock_once(origin_id, dest_id, input.clone())
        })
        .await
    }

    async fn transfer_stock_once(
        &self,
        origin_id: i64,
        dest_id: i64,
        input: TransferInput,
    ) -> AppResult<TransferResult> {
        validate_transfer_route(origin_id, dest_id).map_err(|msg| {
            AppError::validation(
                "dest_id",
                msg,
                "Los almacenes de origen y destino deben ser distintos",
            )
        })?;
        check_quantity("quantity", input.quantity)?;

        let mut tx = self.store.begin().await?;

        for warehouse_id in [origin_id, dest_id] {
            tx.warehouse(warehouse_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;
        }

        let mut origin = tx
            .lock_line(input.line_id)
            .await?
            .filter(|l| l.warehouse_id == Some(origin_id))
            .ok_or_else(|| AppError::NotFound("Stock line".to_string()))?;

        if input.quantity > origin.quantity {
            return Err(AppError::InsufficientStock {
                item_id: origin.item_id,
                available: origin.quantity,
                requested: input.quantity,
            });
        }

        ledger::decrement_line(&mut tx, &mut origin, input.quantity).await?;

        let dest_key = LineKey {
            item_id: origin.item_id,
            batch_id: origin.batch_id,
            warehouse_id: Some(dest_id),
        };
        let destination =
            ledger::increment_or_create(&mut tx, dest_key, input.quantity, origin.entered_at)
                .await?;

        tx.commit().await?;

        tracing::info!(
            "Transferred {} of item {} from warehouse {} (line {}) to warehouse {} (line {})",
            input.quantity,
            origin.item_id,
            origin_id,
            origin.id,
            dest_id,
            destination.id
        );

        Ok(TransferResult {
            origin,
            destination,
            quantity: input.quantity,
        })
    }

    pub async fn set_receipt_status(&self, id: i64, status: ReceiptStatus) -> AppResult<Receipt> {
        retry_on_conflict(self.settings.conflict_retries, "set_receipt_status", move || async move {
            let mut tx = self.store.begin().await?;
            let receipt = tx
                .set_receipt_status(id, status)
                .await?
                .ok_or_else(|| AppError::NotFound("Receipt".to_string()))?;
            tx.commit().await?;

            tracing::info!("Receipt {} status set to {}", id, status.as_str());
            Ok(receipt)
        })
        .await
    }

    pub async fn set_consumption_status(
        &self,
        id: i64,
        status: ConsumptionStatus,
    ) -> AppResult<Consumption> {
        retry_on_conflict(
            self.settings.conflict_retries,
            "set_consumption_status",
            move || async move {
                let mut tx = self.store.begin().await?;
                let consumption = tx
                    .set_consumption_status(id, status)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Consumption".to_string()))?;
                tx.commit().await?;

                tracing::info!("Consumption {} status set to {}", id, status.as_str());
                Ok(consumption)
            },
        )
        .await
    }
}

/// Allocate and journal one consumption inside an open unit of work
pub(crate) async fn consume<U: UnitOfWork>(
    tx: &mut U,
    request: AllocationRequest,
    area: String,
    consumed_on: NaiveDate,
    status: ConsumptionStatus,
) -> AppResult<ConsumptionResult> {
    let allocation = allocation::allocate(tx, request).await?;

    let consumption = tx
        .insert_consumption(NewConsumption {
            item_id: request.item_id,
            batch_id: request.batch_id,
            area,
            consumed_on,
            quantity: request.quantity,
            status,
        })
        .await?;

    tracing::info!(
        "Consumption {} recorded: {} of item {} for {}",
        consumption.id,
        consumption.quantity,
        consumption.item_id,
        consumption.area
    );

    Ok(ConsumptionResult {
        consumption,
        draws: allocation.draws,
    })
}

/// Prices may be zero but not negative, and share the quantity scale
fn check_price(field: &str, value: Decimal) -> AppResult<()> {
    if value < Decimal::ZERO || !fits_quantity_scale(value) {
        return Err(AppError::validation(
            field,
            "Price must be non-negative with at most 4 decimal places",
            "El precio debe ser no negativo y tener como máximo 4 decimales",
        ));
    }
    Ok(())
}

/// Load a batch and check that it holds `item_id`
async fn batch_of_item<U: UnitOfWork>(
    tx: &mut U,
    batch_id: i64,
    item_id: i64,
) -> AppResult<Batch> {
    let batch = tx
        .get_batch(batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
    if batch.item_id != item_id {
        return Err(AppError::validation(
            "batch_id",
            "Batch belongs to a different item",
            "El lote pertenece a otro insumo",
        ));
    }
    Ok(batch)
}
