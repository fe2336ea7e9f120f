//! HTTP handlers for recipe simulation and execution

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::journal::ConsumptionResult;
use crate::services::recipe::FeasibilityReport;
use crate::services::RecipeExpander;
use crate::store::InventoryStore;
use crate::AppState;

/// Body for simulate/execute; `multiplier` defaults to one produced unit
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RecipeRunInput {
    pub multiplier: Option<Decimal>,
    #[validate(length(min = 1, max = 50))]
    pub area: Option<String>,
}

/// Preview a production run without touching stock
pub async fn simulate_recipe<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<RecipeRunInput>,
) -> AppResult<Json<FeasibilityReport>> {
    let expander = RecipeExpander::new(state.store, state.config.ledger.clone());
    let multiplier = input.multiplier.unwrap_or(Decimal::ONE);
    let report = expander.simulate(recipe_id, multiplier).await?;
    Ok(Json(report))
}

/// Consume all ingredients of a production run
pub async fn execute_recipe<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<RecipeRunInput>,
) -> AppResult<Json<Vec<ConsumptionResult>>> {
    input
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let expander = RecipeExpander::new(state.store, state.config.ledger.clone());
    let multiplier = input.multiplier.unwrap_or(Decimal::ONE);
    let consumptions = expander.execute(recipe_id, multiplier, input.area).await?;
    Ok(Json(consumptions))
}
