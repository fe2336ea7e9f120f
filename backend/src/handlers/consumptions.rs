//! HTTP handlers for consumptions (consumos)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{Consumption, ConsumptionStatus};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::journal::{ConsumptionResult, CreateConsumptionInput};
use crate::services::MovementJournal;
use crate::store::InventoryStore;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsumptionStatusInput {
    pub status: ConsumptionStatus,
}

/// Record a consumption, drawing stock FIFO
pub async fn create_consumption<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateConsumptionInput>,
) -> AppResult<(StatusCode, Json<ConsumptionResult>)> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let result = journal.record_consumption(input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Change the status of a consumption
pub async fn set_consumption_status<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path(consumption_id): Path<i64>,
    Json(input): Json<ConsumptionStatusInput>,
) -> AppResult<Json<Consumption>> {
    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let consumption = journal
        .set_consumption_status(consumption_id, input.status)
        .await?;
    Ok(Json(consumption))
}
