//! HTTP handlers for receipts (ingresos)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Receipt, ReceiptStatus};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::journal::{CreateReceiptInput, ReceiptResult};
use crate::services::MovementJournal;
use crate::store::InventoryStore;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReceiptStatusInput {
    pub status: ReceiptStatus,
}

/// Record a receipt
pub async fn create_receipt<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateReceiptInput>,
) -> AppResult<(StatusCode, Json<ReceiptResult>)> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let result = journal.record_receipt(input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Change the status of a receipt
pub async fn set_receipt_status<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path(receipt_id): Path<i64>,
    Json(input): Json<ReceiptStatusInput>,
) -> AppResult<Json<Receipt>> {
    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let receipt = journal.set_receipt_status(receipt_id, input.status).await?;
    Ok(Json(receipt))
}
