//! Error handling for the inventory ledger
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{validation::QUANTITY_SCALE, InvariantViolation, RecipeError};
use thiserror::Error;

/// SQLSTATE serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE deadlock_detected
const DEADLOCK_DETECTED: &str = "40P01";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ledger errors
    #[error("Invalid quantity for {field}: {value}")]
    InvalidQuantity { field: String, value: Decimal },

    #[error("Insufficient stock for item {item_id}: {available} available, {requested} requested")]
    InsufficientStock {
        item_id: i64,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Concurrent update conflict")]
    ConcurrencyConflict,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_quantity(field: &str, value: Decimal) -> Self {
        AppError::InvalidQuantity {
            field: field.to_string(),
            value,
        }
    }

    pub fn validation(field: &str, message: &str, message_es: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
            message_es: message_es.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidQuantity { .. }
            | AppError::Validation { .. }
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ConcurrencyConflict => StatusCode::CONFLICT,
            AppError::InvalidAllocation(_)
            | AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                tracing::warn!("Transaction aborted by concurrent writer: {}", err);
                AppError::ConcurrencyConflict
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<InvariantViolation> for AppError {
    fn from(err: InvariantViolation) -> Self {
        tracing::error!("Ledger invariant violated: {}", err);
        AppError::InvalidAllocation(err.to_string())
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::Empty(_) => AppError::validation(
                "recipe_id",
                "Recipe has no lines",
                "La receta no tiene detalles",
            ),
            RecipeError::NonPositiveMultiplier(value) => {
                AppError::invalid_quantity("multiplier", value)
            }
            RecipeError::NonPositiveProportion { proportion, .. } => {
                AppError::invalid_quantity("proportion", proportion)
            }
            RecipeError::BelowPrecision { quantity, .. } => {
                AppError::invalid_quantity("multiplier", quantity)
            }
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_detail = match &self {
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message_en: format!("{} not found", resource),
                message_es: format!("{} no encontrado", resource),
                field: None,
            },
            AppError::InvalidQuantity { field, value } => ErrorDetail {
                code: "INVALID_QUANTITY".to_string(),
                message_en: format!(
                    "{} must be greater than zero with at most {} decimal places, got {}",
                    field, QUANTITY_SCALE, value
                ),
                message_es: format!(
                    "{} debe ser mayor que cero y tener como máximo {} decimales, se recibió {}",
                    field, QUANTITY_SCALE, value
                ),
                field: Some(field.clone()),
            },
            AppError::InsufficientStock {
                item_id,
                available,
                requested,
            } => ErrorDetail {
                code: "INSUFFICIENT_STOCK".to_string(),
                message_en: format!(
                    "Insufficient stock for item {}: {} available, {} requested",
                    item_id, available, requested
                ),
                message_es: format!(
                    "Stock insuficiente para el insumo {}: disponible {}, solicitado {}",
                    item_id, available, requested
                ),
                field: None,
            },
            AppError::ConcurrencyConflict => ErrorDetail {
                code: "CONCURRENCY_CONFLICT".to_string(),
                message_en: "The stock was modified concurrently, please retry".to_string(),
                message_es: "El stock fue modificado concurrentemente, intente de nuevo"
                    .to_string(),
                field: None,
            },
            AppError::Validation {
                field,
                message,
                message_es,
            } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: message.clone(),
                message_es: message_es.clone(),
                field: Some(field.clone()),
            },
            AppError::ValidationError(msg) => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message_en: msg.clone(),
                message_es: format!("Datos inválidos: {}", msg),
                field: None,
            },
            AppError::Configuration(msg) => ErrorDetail {
                code: "CONFIGURATION_ERROR".to_string(),
                message_en: format!("Configuration error: {}", msg),
                message_es: format!("Error de configuración: {}", msg),
                field: None,
            },
            AppError::DatabaseError(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message_en: "A database error occurred".to_string(),
                message_es: "Ocurrió un error en la base de datos".to_string(),
                field: None,
            },
            AppError::InvalidAllocation(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_es: "Ocurrió un error interno del servidor".to_string(),
                    field: None,
                }
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
