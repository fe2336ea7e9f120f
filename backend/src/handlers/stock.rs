//! HTTP handler for stock availability

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::stock::{AvailableStock, LowStockReport};
use crate::services::StockQuery;
use crate::store::InventoryStore;
use crate::AppState;

/// Query parameters for availability
#[derive(Debug, Deserialize)]
pub struct AvailableQuery {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

pub async fn get_available_stock<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<AvailableQuery>,
) -> AppResult<Json<AvailableStock>> {
    let service = StockQuery::new(state.store, state.config.ledger.stock_levels);
    let available = service
        .available(query.item_id, query.batch_id, query.warehouse_id)
        .await?;
    Ok(Json(available))
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub minimum: Option<Decimal>,
}

/// Stock lines running low, graded by urgency
pub async fn get_low_stock<S: InventoryStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<LowStockReport>> {
    let service = StockQuery::new(state.store, state.config.ledger.stock_levels);
    let report = service.low_stock(query.minimum).await?;
    Ok(Json(report))
}
