//! FIFO allocation engine
//!
//! Locks the candidate lines, plans the draws with [`shared::plan_fifo`] and
//! applies them to lines and batches inside the caller's unit of work.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{plan_fifo, Draw, LineFilter, PlanError, StockLine};

use super::{check_quantity, ledger, lot};
use crate::error::{AppError, AppResult};
use crate::store::UnitOfWork;

/// What to allocate and where to take it from
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest {
    pub item_id: i64,
    pub quantity: Decimal,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

impl AllocationRequest {
    pub fn item(item_id: i64, quantity: Decimal) -> Self {
        Self {
            item_id,
            quantity,
            batch_id: None,
            warehouse_id: None,
        }
    }

    pub fn filter(&self) -> LineFilter {
        LineFilter {
            item_id: self.item_id,
            batch_id: self.batch_id,
            warehouse_id: self.warehouse_id,
        }
    }
}

/// Result of a successful allocation
#[derive(Debug, Clone, Serialize)]
pub struct Allocation {
    pub item_id: i64,
    pub requested: Decimal,
    pub draws: Vec<Draw>,
}

pub(crate) fn plan_error(item_id: i64, err: PlanError) -> AppError {
    match err {
        PlanError::NonPositiveRequest(value) => AppError::invalid_quantity("quantity", value),
        PlanError::Insufficient {
            available,
            requested,
        } => AppError::InsufficientStock {
            item_id,
            available,
            requested,
        },
    }
}

/// Take `request.quantity` of the item oldest-first.
///
/// Fails with `InsufficientStock` before touching anything when the matching
/// lines cannot cover the request.
pub async fn allocate<U: UnitOfWork>(tx: &mut U, request: AllocationRequest) -> AppResult<Allocation> {
    check_quantity("quantity", request.quantity)?;

    let lines = tx.lock_lines(request.filter()).await?;
    let plan = plan_fifo(&lines, request.quantity).map_err(|e| plan_error(request.item_id, e))?;

    let mut by_id: HashMap<i64, StockLine> = lines.into_iter().map(|l| (l.id, l)).collect();
    for draw in &plan.draws {
        let line = by_id.get_mut(&draw.line_id).ok_or_else(|| {
            AppError::InvalidAllocation(format!("planned line {} was not locked", draw.line_id))
        })?;
        ledger::decrement_line(tx, line, draw.taken).await?;

        if let Some(batch_id) = draw.batch_id {
            lot::reduce_remaining(tx, batch_id, draw.taken).await?;
        }
    }

    tracing::info!(
        "Allocated {} of item {} from {} line(s), {} was available",
        request.quantity,
        request.item_id,
        plan.draws.len(),
        plan.available
    );

    Ok(Allocation {
        item_id: request.item_id,
        requested: request.quantity,
        draws: plan.draws,
    })
}
