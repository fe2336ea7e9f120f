//! Domain models for the warehouse inventory ledger

mod batch;
mod item;
mod movement;
mod recipe;
mod stock;

pub use batch::*;
pub use item::*;
pub use movement::*;
pub use recipe::*;
pub use stock::*;

use rust_decimal::Decimal;
use thiserror::Error;

/// A quantity change that would break a ledger invariant.
///
/// The engine checks availability before mutating anything, so reaching one
/// of these means a bug or a concurrent writer slipped past the row locks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("movement amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    #[error("stock line {line_id} holds {quantity}, cannot remove {amount}")]
    LineUnderflow {
        line_id: i64,
        quantity: Decimal,
        amount: Decimal,
    },

    #[error("batch {batch_id} has {remaining} remaining, cannot remove {amount}")]
    BatchUnderflow {
        batch_id: i64,
        remaining: Decimal,
        amount: Decimal,
    },
}
