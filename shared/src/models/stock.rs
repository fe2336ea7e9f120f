//! Stock lines: quantity of an item held in a place, optionally tied to a batch

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::InvariantViolation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLine {
    pub id: i64,
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub quantity: Decimal,
    /// FIFO ordering key
    pub entered_at: DateTime<Utc>,
    /// Set when the line reaches zero
    pub exited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewStockLine {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub quantity: Decimal,
    pub entered_at: DateTime<Utc>,
}

/// Identity of a line for increment-or-create: at most one line per key
/// is topped up, `None` components match only `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

/// Availability filter. `None` components mean "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFilter {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
}

impl LineFilter {
    pub fn item(item_id: i64) -> Self {
        Self {
            item_id,
            ..Default::default()
        }
    }

    pub fn matches(&self, line: &StockLine) -> bool {
        line.item_id == self.item_id
            && self.batch_id.map_or(true, |b| line.batch_id == Some(b))
            && self.warehouse_id.map_or(true, |w| line.warehouse_id == Some(w))
    }
}

impl StockLine {
    pub fn key(&self) -> LineKey {
        LineKey {
            item_id: self.item_id,
            batch_id: self.batch_id,
            warehouse_id: self.warehouse_id,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }

    pub fn increment(&mut self, amount: Decimal) -> Result<(), InvariantViolation> {
        if amount <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveAmount { amount });
        }
        // exited_at is historical and survives a refill
        self.quantity += amount;
        Ok(())
    }

    /// Remove `amount`, stamping `exited_at` when the line is emptied.
    pub fn decrement(
        &mut self,
        amount: Decimal,
        at: DateTime<Utc>,
    ) -> Result<(), InvariantViolation> {
        if amount <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveAmount { amount });
        }
        if amount > self.quantity {
            return Err(InvariantViolation::LineUnderflow {
                line_id: self.id,
                quantity: self.quantity,
                amount,
            });
        }

        self.quantity -= amount;
        if self.quantity == Decimal::ZERO {
            self.exited_at = Some(at);
        }
        Ok(())
    }
}

/// Sort lines into FIFO consumption order (oldest entry first, id breaks ties)
pub fn sort_fifo(lines: &mut [StockLine]) {
    lines.sort_by(|a, b| a.entered_at.cmp(&b.entered_at).then(a.id.cmp(&b.id)));
}

/// Urgency of a low-stock line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl StockLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Critical => "CRITICAL",
            StockLevel::High => "HIGH",
            StockLevel::Medium => "MEDIUM",
            StockLevel::Low => "LOW",
        }
    }
}

/// Quantity thresholds used to grade low stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevelPolicy {
    /// `q <= critical` is CRITICAL
    pub critical: Decimal,
    /// `critical < q <= high` is HIGH
    pub high: Decimal,
    /// `high < q <= medium` is MEDIUM, anything above is LOW
    pub medium: Decimal,
    /// Lines at or below this quantity are reported when no minimum is given
    pub default_minimum: Decimal,
}

impl Default for StockLevelPolicy {
    fn default() -> Self {
        Self {
            critical: Decimal::from(3),
            high: Decimal::from(5),
            medium: Decimal::from(10),
            default_minimum: Decimal::from(10),
        }
    }
}

impl StockLevelPolicy {
    pub fn classify(&self, quantity: Decimal) -> StockLevel {
        if quantity <= self.critical {
            StockLevel::Critical
        } else if quantity <= self.high {
            StockLevel::High
        } else if quantity <= self.medium {
            StockLevel::Medium
        } else {
            StockLevel::Low
        }
    }
}
