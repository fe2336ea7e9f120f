//! Lot registry: batch lifecycle and expiration alerting

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    days_until, Batch, BatchClassification, BatchState, ExpirationPolicy, NewBatch,
};

use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, UnitOfWork};

/// Register a new batch holding its full initial quantity
pub async fn create_batch<U: UnitOfWork>(tx: &mut U, batch: NewBatch) -> AppResult<Batch> {
    if batch.initial_quantity <= Decimal::ZERO {
        return Err(AppError::invalid_quantity(
            "initial_quantity",
            batch.initial_quantity,
        ));
    }

    let created = tx.insert_batch(batch).await?;
    tracing::info!(
        "Created batch {} ({:?}) for item {} with {}",
        created.id,
        created.number,
        created.item_id,
        created.initial_quantity
    );
    Ok(created)
}

/// Receive more stock into an existing batch
pub async fn augment_batch<U: UnitOfWork>(
    tx: &mut U,
    batch_id: i64,
    amount: Decimal,
) -> AppResult<Batch> {
    let mut batch = tx
        .lock_batch(batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

    if batch.is_exhausted() {
        tracing::warn!(
            "Receiving {} into exhausted batch {}; it stays EXHAUSTED",
            amount,
            batch.id
        );
    }

    batch.augment(amount)?;
    tx.update_batch(&batch).await?;
    Ok(batch)
}

/// Take `amount` out of a batch, exhausting it at zero
pub async fn reduce_remaining<U: UnitOfWork>(
    tx: &mut U,
    batch_id: i64,
    amount: Decimal,
) -> AppResult<Batch> {
    let mut batch = tx.lock_batch(batch_id).await?.ok_or_else(|| {
        tracing::error!("Stock line references missing batch {}", batch_id);
        AppError::InvalidAllocation(format!("batch {} not found", batch_id))
    })?;

    batch.reduce_remaining(amount)?;
    tx.update_batch(&batch).await?;

    if batch.is_exhausted() {
        tracing::info!("Batch {} exhausted", batch.id);
    }
    Ok(batch)
}

/// A batch past its expiration date that still holds stock
#[derive(Debug, Clone, Serialize)]
pub struct ExpiredBatch {
    pub batch_id: i64,
    pub item_id: i64,
    pub number: Option<String>,
    pub expiration_date: NaiveDate,
    pub remaining_quantity: Decimal,
    pub days_expired: i64,
}

/// Read-side service over batches
#[derive(Clone)]
pub struct LotRegistry<S> {
    store: S,
    policy: ExpirationPolicy,
}

impl<S: InventoryStore> LotRegistry<S> {
    pub fn new(store: S, policy: ExpirationPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn get_batch(&self, batch_id: i64) -> AppResult<Batch> {
        let mut tx = self.store.begin().await?;
        let batch = tx
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
        Ok(batch)
    }

    /// Expiration class of one batch as of `as_of`
    pub async fn classification(
        &self,
        batch_id: i64,
        as_of: NaiveDate,
    ) -> AppResult<BatchClassification> {
        let batch = self.get_batch(batch_id).await?;
        Ok(batch.classify(&self.policy, as_of))
    }

    /// ACTIVE batches with stock expiring after `as_of` and within
    /// `window_days`
    pub async fn expiring(
        &self,
        as_of: NaiveDate,
        window_days: Option<i64>,
    ) -> AppResult<Vec<BatchClassification>> {
        let window = window_days.unwrap_or(self.policy.alert_window_days);
        if window <= 0 {
            return Err(AppError::validation(
                "days",
                "Window must be greater than zero",
                "La ventana debe ser mayor que cero",
            ));
        }

        let until = as_of + Duration::days(window);
        let mut tx = self.store.begin().await?;
        let batches = tx.stocked_batches_expiring_by(until).await?;

        Ok(batches
            .into_iter()
            .filter(|b| b.state == BatchState::Active)
            .filter(|b| b.expiration_date.is_some_and(|exp| exp > as_of))
            .map(|b| b.classify(&self.policy, as_of))
            .collect())
    }

    /// ACTIVE batches holding stock, soonest expiration first and undated
    /// batches last
    pub async fn active(&self, as_of: NaiveDate) -> AppResult<Vec<BatchClassification>> {
        let mut tx = self.store.begin().await?;
        let batches = tx.active_batches().await?;

        Ok(batches
            .into_iter()
            .map(|b| b.classify(&self.policy, as_of))
            .collect())
    }

    /// Stocked batches expired on or before `as_of`, most expired first
    pub async fn expired(&self, as_of: NaiveDate) -> AppResult<Vec<ExpiredBatch>> {
        let mut tx = self.store.begin().await?;
        let batches = tx.stocked_batches_expiring_by(as_of).await?;

        Ok(batches
            .into_iter()
            .filter_map(|b| {
                let expiration_date = b.expiration_date?;
                Some(ExpiredBatch {
                    batch_id: b.id,
                    item_id: b.item_id,
                    number: b.number,
                    expiration_date,
                    remaining_quantity: b.remaining_quantity,
                    days_expired: -days_until(expiration_date, as_of),
                })
            })
            .collect())
    }
}
