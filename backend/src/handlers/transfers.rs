//! HTTP handler for stock transfers between warehouses

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::services::journal::{TransferInput, TransferResult};
use crate::services::MovementJournal;
use crate::store::InventoryStore;
use crate::AppState;

/// Move stock of one line from the origin warehouse to the destination
pub async fn transfer_stock<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path((origin_id, dest_id)): Path<(i64, i64)>,
    Json(input): Json<TransferInput>,
) -> AppResult<Json<TransferResult>> {
    let journal = MovementJournal::new(state.store, state.config.ledger.clone());
    let result = journal.transfer_stock(origin_id, dest_id, input).await?;
    Ok(Json(result))
}
