//! Stock ledger primitives
//!
//! Every function runs inside the caller's unit of work. Lines are only ever
//! written through here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{available_quantity as sum_available, LineFilter, LineKey, NewStockLine, StockLine};

use crate::error::{AppError, AppResult};
use crate::store::UnitOfWork;

/// Open a new stock line
pub async fn create_line<U: UnitOfWork>(tx: &mut U, line: NewStockLine) -> AppResult<StockLine> {
    if line.quantity <= Decimal::ZERO {
        return Err(AppError::invalid_quantity("quantity", line.quantity));
    }

    let created = tx.insert_line(line).await?;
    tracing::debug!(
        "Created stock line {} for item {} (batch {:?}, warehouse {:?}): {}",
        created.id,
        created.item_id,
        created.batch_id,
        created.warehouse_id,
        created.quantity
    );
    Ok(created)
}

/// Add `amount` to a locked line
pub async fn increment_line<U: UnitOfWork>(
    tx: &mut U,
    line: &mut StockLine,
    amount: Decimal,
) -> AppResult<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::invalid_quantity("quantity", amount));
    }
    line.increment(amount)?;
    tx.update_line(line).await
}

/// Remove `amount` from a locked line; the line is closed when it reaches zero
pub async fn decrement_line<U: UnitOfWork>(
    tx: &mut U,
    line: &mut StockLine,
    amount: Decimal,
) -> AppResult<()> {
    line.decrement(amount, Utc::now())?;
    tx.update_line(line).await?;

    if line.is_depleted() {
        tracing::debug!("Stock line {} depleted", line.id);
    }
    Ok(())
}

/// Sum of stock over lines matching `filter`
pub async fn available_quantity<U: UnitOfWork>(tx: &mut U, filter: LineFilter) -> AppResult<Decimal> {
    let lines = tx.list_lines(filter).await?;
    Ok(sum_available(&lines))
}

/// Top up the line identified by `key`, or open one entered at `entered_at`
pub async fn increment_or_create<U: UnitOfWork>(
    tx: &mut U,
    key: LineKey,
    amount: Decimal,
    entered_at: DateTime<Utc>,
) -> AppResult<StockLine> {
    match tx.lock_line_by_key(key).await? {
        Some(mut line) => {
            increment_line(tx, &mut line, amount).await?;
            tracing::debug!("Incremented stock line {} by {}", line.id, amount);
            Ok(line)
        }
        None => {
            create_line(
                tx,
                NewStockLine {
                    item_id: key.item_id,
                    batch_id: key.batch_id,
                    warehouse_id: key.warehouse_id,
                    quantity: amount,
                    entered_at,
                },
            )
            .await
        }
    }
}
