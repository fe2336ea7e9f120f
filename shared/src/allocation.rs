//! FIFO draw planning
//!
//! Given the candidate stock lines for an item, decide how much to take from
//! each line so that `requested` is satisfied oldest-first. Planning is pure:
//! the backend locks the lines, calls [`plan_fifo`], and then applies the
//! draws inside its unit of work.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{sort_fifo, StockLine};

/// Quantity taken from one stock line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draw {
    pub line_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub taken: Decimal,
    pub remaining_on_line: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    pub draws: Vec<Draw>,
    /// Stock available across the candidate lines before drawing
    pub available: Decimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("requested quantity must be positive, got {0}")]
    NonPositiveRequest(Decimal),

    #[error("insufficient stock: {available} available, {requested} requested")]
    Insufficient {
        available: Decimal,
        requested: Decimal,
    },
}

/// Sum of quantity over lines holding stock
pub fn available_quantity<'a>(lines: impl IntoIterator<Item = &'a StockLine>) -> Decimal {
    lines
        .into_iter()
        .filter(|l| l.quantity > Decimal::ZERO)
        .map(|l| l.quantity)
        .sum()
}

/// Plan a FIFO allocation of `requested` over `lines`.
///
/// Lines with no stock are skipped. Only the last draw may leave stock on its
/// line.
pub fn plan_fifo(lines: &[StockLine], requested: Decimal) -> Result<AllocationPlan, PlanError> {
    if requested <= Decimal::ZERO {
        return Err(PlanError::NonPositiveRequest(requested));
    }

    let mut candidates: Vec<StockLine> = lines
        .iter()
        .filter(|l| l.quantity > Decimal::ZERO)
        .cloned()
        .collect();
    sort_fifo(&mut candidates);

    let available = available_quantity(&candidates);
    if available < requested {
        return Err(PlanError::Insufficient {
            available,
            requested,
        });
    }

    let mut draws = Vec::new();
    let mut needed = requested;
    for line in &candidates {
        if needed <= Decimal::ZERO {
            break;
        }
        let taken = line.quantity.min(needed);
        needed -= taken;
        draws.push(Draw {
            line_id: line.id,
            batch_id: line.batch_id,
            warehouse_id: line.warehouse_id,
            taken,
            remaining_on_line: line.quantity - taken,
        });
    }

    Ok(AllocationPlan { draws, available })
}

/// Subtract each draw from its line in `lines`.
///
/// Used to plan several allocations against the same snapshot without
/// counting a line's stock twice.
pub fn apply_draws(lines: &mut [StockLine], draws: &[Draw]) {
    for draw in draws {
        if let Some(line) = lines.iter_mut().find(|l| l.id == draw.line_id) {
            line.quantity = draw.remaining_on_line;
        }
    }
}
