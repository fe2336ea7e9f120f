//! Route definitions for the inventory ledger API

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers;
use crate::store::InventoryStore;
use crate::AppState;

/// Create API routes
pub fn api_routes<S: InventoryStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .nest("/receipts", receipt_routes())
        .nest("/consumptions", consumption_routes())
        .route("/weighings", post(handlers::create_weighing::<S>))
        .route(
            "/warehouses/:origin_id/transfer/:dest_id",
            post(handlers::transfer_stock::<S>),
        )
        .route("/stock/available", get(handlers::get_available_stock::<S>))
        .route("/stock/low", get(handlers::get_low_stock::<S>))
        .nest("/recipes", recipe_routes())
        .nest("/batches", batch_routes())
}

/// Receipt routes
fn receipt_routes<S: InventoryStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(handlers::create_receipt::<S>))
        .route("/:receipt_id/status", patch(handlers::set_receipt_status::<S>))
}

/// Consumption routes
fn consumption_routes<S: InventoryStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(handlers::create_consumption::<S>))
        .route(
            "/:consumption_id/status",
            patch(handlers::set_consumption_status::<S>),
        )
}

/// Recipe routes
fn recipe_routes<S: InventoryStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/:recipe_id/simulate", post(handlers::simulate_recipe::<S>))
        .route("/:recipe_id/execute", post(handlers::execute_recipe::<S>))
}

/// Batch listing and expiration routes
fn batch_routes<S: InventoryStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/active", get(handlers::get_active_batches::<S>))
        .route("/expiring", get(handlers::get_expiring_batches::<S>))
        .route("/expired", get(handlers::get_expired_batches::<S>))
        .route(
            "/:batch_id/classification",
            get(handlers::get_batch_classification::<S>),
        )
}
