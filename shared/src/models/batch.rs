//! Batch (lote) models and lifecycle rules

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::InvariantViolation;

/// A received lot of an item with its own expiration and remaining quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Batch {
    pub id: i64,
    pub item_id: i64,
    /// Supplier or internal lot number
    pub number: Option<String>,
    pub location: Option<String>,
    /// Total quantity ever received into this batch
    pub initial_quantity: Decimal,
    /// Must equal the sum of the batch's stock lines
    pub remaining_quantity: Decimal,
    pub expiration_date: Option<NaiveDate>,
    pub total_price: Option<Decimal>,
    pub state: BatchState,
    pub created_at: DateTime<Utc>,
}

/// Batch lifecycle state. `Exhausted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    Active,
    Exhausted,
}

impl BatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchState::Active => "ACTIVE",
            BatchState::Exhausted => "EXHAUSTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(BatchState::Active),
            "EXHAUSTED" => Some(BatchState::Exhausted),
            _ => None,
        }
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values for a batch about to be created by a receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBatch {
    pub item_id: i64,
    pub number: Option<String>,
    pub location: Option<String>,
    pub initial_quantity: Decimal,
    pub expiration_date: Option<NaiveDate>,
    pub total_price: Option<Decimal>,
}

impl Batch {
    pub fn is_exhausted(&self) -> bool {
        self.state == BatchState::Exhausted
    }

    /// Take `amount` out of the batch, exhausting it once nothing remains.
    pub fn reduce_remaining(&mut self, amount: Decimal) -> Result<(), InvariantViolation> {
        if amount <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveAmount { amount });
        }
        if amount > self.remaining_quantity {
            return Err(InvariantViolation::BatchUnderflow {
                batch_id: self.id,
                remaining: self.remaining_quantity,
                amount,
            });
        }

        self.remaining_quantity -= amount;
        if self.remaining_quantity <= Decimal::ZERO {
            self.state = BatchState::Exhausted;
        }
        Ok(())
    }

    /// Add received stock to an existing batch.
    ///
    /// The state is left untouched: an exhausted batch stays exhausted even
    /// though it holds stock again.
    pub fn augment(&mut self, amount: Decimal) -> Result<(), InvariantViolation> {
        if amount <= Decimal::ZERO {
            return Err(InvariantViolation::NonPositiveAmount { amount });
        }
        self.initial_quantity += amount;
        self.remaining_quantity += amount;
        Ok(())
    }

    /// Classify this batch's expiration against `today`
    pub fn classify(&self, policy: &ExpirationPolicy, today: NaiveDate) -> BatchClassification {
        let days_remaining = self.expiration_date.map(|exp| days_until(exp, today));

        BatchClassification {
            batch_id: self.id,
            item_id: self.item_id,
            number: self.number.clone(),
            expiration_date: self.expiration_date,
            remaining_quantity: self.remaining_quantity,
            days_remaining,
            class: days_remaining.map(|d| policy.classify_days(d)),
            in_window: days_remaining.is_some_and(|d| d <= policy.alert_window_days),
        }
    }
}

/// Expiration criticality of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationClass {
    Expired,
    Critical,
    High,
    Medium,
}

impl ExpirationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationClass::Expired => "EXPIRED",
            ExpirationClass::Critical => "CRITICAL",
            ExpirationClass::High => "HIGH",
            ExpirationClass::Medium => "MEDIUM",
        }
    }
}

/// Day thresholds used to classify expirations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationPolicy {
    /// `0 < d <= critical_days` is CRITICAL
    pub critical_days: i64,
    /// `critical_days < d <= high_days` is HIGH
    pub high_days: i64,
    /// Batches expiring within this many days are alerted on
    pub alert_window_days: i64,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            critical_days: 7,
            high_days: 15,
            alert_window_days: 30,
        }
    }
}

impl ExpirationPolicy {
    /// Variant used by the expiration report (no 15-day tier)
    pub fn reporting() -> Self {
        Self {
            high_days: 30,
            ..Self::default()
        }
    }

    pub fn classify(&self, expiration: NaiveDate, today: NaiveDate) -> ExpirationClass {
        self.classify_days(days_until(expiration, today))
    }

    pub fn classify_days(&self, days: i64) -> ExpirationClass {
        if days <= 0 {
            ExpirationClass::Expired
        } else if days <= self.critical_days {
            ExpirationClass::Critical
        } else if days <= self.high_days {
            ExpirationClass::High
        } else {
            ExpirationClass::Medium
        }
    }
}

/// Whole days from `today` until `expiration` (negative once past)
pub fn days_until(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

/// Expiration view of one batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchClassification {
    pub batch_id: i64,
    pub item_id: i64,
    pub number: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub remaining_quantity: Decimal,
    pub days_remaining: Option<i64>,
    /// `None` when the batch has no expiration date
    pub class: Option<ExpirationClass>,
    pub in_window: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn batch(remaining: &str) -> Batch {
        Batch {
            id: 1,
            item_id: 10,
            number: Some("L-001".to_string()),
            location: None,
            initial_quantity: dec(remaining),
            remaining_quantity: dec(remaining),
            expiration_date: Some(date(2024, 6, 30)),
            total_price: None,
            state: BatchState::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reduce_keeps_active_while_stock_remains() {
        let mut b = batch("8");
        b.reduce_remaining(dec("6")).unwrap();
        assert_eq!(b.remaining_quantity, dec("2"));
        assert_eq!(b.state, BatchState::Active);
    }

    #[test]
    fn test_reduce_to_zero_exhausts() {
        let mut b = batch("2");
        b.reduce_remaining(dec("2")).unwrap();
        assert_eq!(b.remaining_quantity, Decimal::ZERO);
        assert!(b.is_exhausted());
    }

    #[test]
    fn test_reduce_below_zero_is_rejected() {
        let mut b = batch("2");
        let err = b.reduce_remaining(dec("2.5")).unwrap_err();
        assert!(matches!(err, InvariantViolation::BatchUnderflow { batch_id: 1, .. }));
        assert_eq!(b.remaining_quantity, dec("2"));
        assert_eq!(b.state, BatchState::Active);
    }

    #[test]
    fn test_augment_does_not_reactivate() {
        let mut b = batch("1");
        b.reduce_remaining(dec("1")).unwrap();
        b.augment(dec("4")).unwrap();
        assert_eq!(b.remaining_quantity, dec("4"));
        assert_eq!(b.initial_quantity, dec("5"));
        assert_eq!(b.state, BatchState::Exhausted);
    }

    #[test]
    fn test_state_round_trips_through_storage_string() {
        for state in [BatchState::Active, BatchState::Exhausted] {
            assert_eq!(BatchState::parse(state.as_str()), Some(state));
        }
        assert_eq!(BatchState::parse("AGOTADO"), None);
        assert_eq!(serde_json::to_string(&BatchState::Exhausted).unwrap(), "\"EXHAUSTED\"");
    }

    #[test]
    fn test_classification_thresholds() {
        let policy = ExpirationPolicy::default();
        let today = date(2024, 6, 1);

        assert_eq!(policy.classify(date(2024, 5, 20), today), ExpirationClass::Expired);
        assert_eq!(policy.classify(today, today), ExpirationClass::Expired);
        assert_eq!(policy.classify(date(2024, 6, 2), today), ExpirationClass::Critical);
        assert_eq!(policy.classify(date(2024, 6, 8), today), ExpirationClass::Critical);
        assert_eq!(policy.classify(date(2024, 6, 9), today), ExpirationClass::High);
        assert_eq!(policy.classify(date(2024, 6, 16), today), ExpirationClass::High);
        assert_eq!(policy.classify(date(2024, 6, 17), today), ExpirationClass::Medium);
    }

    #[test]
    fn test_reporting_policy_has_no_fifteen_day_tier() {
        let policy = ExpirationPolicy::reporting();
        assert_eq!(policy.classify_days(20), ExpirationClass::High);
        assert_eq!(policy.classify_days(30), ExpirationClass::High);
        assert_eq!(policy.classify_days(31), ExpirationClass::Medium);
    }

    #[test]
    fn test_batch_classification_window() {
        let policy = ExpirationPolicy::default();
        let b = batch("3");

        let near = b.classify(&policy, date(2024, 6, 10));
        assert_eq!(near.days_remaining, Some(20));
        assert_eq!(near.class, Some(ExpirationClass::Medium));
        assert!(near.in_window);

        let far = b.classify(&policy, date(2024, 4, 1));
        assert!(!far.in_window);

        let mut undated = batch("3");
        undated.expiration_date = None;
        let view = undated.classify(&policy, date(2024, 6, 10));
        assert_eq!(view.class, None);
        assert!(!view.in_window);
    }
}
