//! Business logic services for the inventory ledger
//!
//! `ledger`, `lot` and `allocation` hold the primitives that run inside a
//! caller's unit of work. The service structs open and commit units of work.

pub mod allocation;
pub mod journal;
pub mod ledger;
pub mod lot;
pub mod recipe;
pub mod stock;

pub use journal::MovementJournal;
pub use lot::LotRegistry;
pub use recipe::RecipeExpander;
pub use stock::StockQuery;

use std::future::Future;

use rust_decimal::Decimal;
use shared::fits_quantity_scale;

use crate::error::{AppError, AppResult};

/// Reject amounts that are not positive or that carry more decimal places
/// than the store keeps.
pub(crate) fn check_quantity(field: &str, value: Decimal) -> AppResult<()> {
    if value <= Decimal::ZERO || !fits_quantity_scale(value) {
        return Err(AppError::invalid_quantity(field, value));
    }
    Ok(())
}

/// Run `op`, retrying up to `retries` more times while it reports a
/// concurrency conflict.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    retries: u32,
    operation: &str,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(AppError::ConcurrencyConflict) if attempt < retries => {
                attempt += 1;
                tracing::warn!(
                    "{} hit a concurrency conflict, retrying ({}/{})",
                    operation,
                    attempt,
                    retries
                );
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_check_quantity() {
        assert!(check_quantity("quantity", Decimal::new(15, 1)).is_ok());
        assert!(check_quantity("quantity", Decimal::new(10000, 4)).is_ok());
        // trailing zeros do not count against the scale
        assert!(check_quantity("quantity", Decimal::new(120000, 5)).is_ok());
        assert!(check_quantity("quantity", Decimal::new(100005, 5)).is_err());
        assert!(check_quantity("quantity", Decimal::ZERO).is_err());
        assert!(matches!(
            check_quantity("multiplier", Decimal::new(-1, 0)),
            Err(AppError::InvalidQuantity { ref field, .. }) if field == "multiplier"
        ));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_on_conflict(3, "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::ConcurrencyConflict)
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_limit() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_on_conflict(2, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::ConcurrencyConflict)
        })
        .await;

        assert!(matches!(result, Err(AppError::ConcurrencyConflict)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: AppResult<()> = retry_on_conflict(5, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NotFound("Item".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
