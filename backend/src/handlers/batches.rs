//! HTTP handlers for batch expiration

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{validate_window_days, BatchClassification};

use crate::error::{AppError, AppResult};
use crate::services::lot::ExpiredBatch;
use crate::services::LotRegistry;
use crate::store::InventoryStore;
use crate::AppState;

/// Reference date; defaults to today
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

/// Query parameters for expiring batches
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub as_of: Option<NaiveDate>,
    pub days: Option<i64>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Expiration class of one batch
pub async fn get_batch_classification<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Path(batch_id): Path<i64>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<BatchClassification>> {
    let registry = LotRegistry::new(state.store, state.config.ledger.expiration);
    let classification = registry
        .classification(batch_id, query.as_of.unwrap_or_else(today))
        .await?;
    Ok(Json(classification))
}

/// Batches expiring within the alert window
pub async fn get_expiring_batches<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<BatchClassification>>> {
    if let Some(days) = query.days {
        validate_window_days(days).map_err(|msg| {
            AppError::validation("days", msg, "La ventana debe estar entre 1 y 366 días")
        })?;
    }

    let registry = LotRegistry::new(state.store, state.config.ledger.expiration);
    let expiring = registry
        .expiring(query.as_of.unwrap_or_else(today), query.days)
        .await?;
    Ok(Json(expiring))
}

/// Expired batches still holding stock
pub async fn get_expired_batches<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<ExpiredBatch>>> {
    let registry = LotRegistry::new(state.store, state.config.ledger.expiration);
    let expired = registry.expired(query.as_of.unwrap_or_else(today)).await?;
    Ok(Json(expired))
}

/// ACTIVE batches holding stock, soonest expiration first
pub async fn get_active_batches<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<AsOfQuery>,
) -> AppResult<Json<Vec<BatchClassification>>> {
    let registry = LotRegistry::new(state.store, state.config.ledger.expiration);
    let active = registry.active(query.as_of.unwrap_or_else(today)).await?;
    Ok(Json(active))
}
