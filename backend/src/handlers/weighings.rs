//! HTTP handler for weighing registration (pesado)

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::journal::{WeighingInput, WeighingResult};
use crate::services::MovementJournal;
use crate::store::InventoryStore;
use crate::AppState;

/// Register a weighing, drawing its net weight from the batch
pub async fn create_weighing<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<WeighingInput>,
) -> AppResult<(StatusCode, Json<WeighingResult>)> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let result = journal.record_weighing(input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
