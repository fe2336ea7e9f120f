//! Receipts (ingresos) and consumptions (consumos)
//!
//! Movements are append-only; only their status may change afterwards and a
//! status change never touches stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::round_quantity;

/// Goods received into stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receipt {
    pub id: i64,
    pub item_id: i64,
    pub item_supplier_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    /// `unit_price × quantity`
    pub total_price: Option<Decimal>,
    pub received_on: NaiveDate,
    pub delivery_note: Option<String>,
    pub purchase_order: Option<String>,
    pub status: ReceiptStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Pending,
    #[default]
    Received,
    Partial,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "PENDING",
            ReceiptStatus::Received => "RECEIVED",
            ReceiptStatus::Partial => "PARTIAL",
            ReceiptStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReceiptStatus::Pending),
            "RECEIVED" => Some(ReceiptStatus::Received),
            "PARTIAL" => Some(ReceiptStatus::Partial),
            "CANCELLED" => Some(ReceiptStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewReceipt {
    pub item_id: i64,
    pub item_supplier_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub received_on: NaiveDate,
    pub delivery_note: Option<String>,
    pub purchase_order: Option<String>,
}

impl NewReceipt {
    /// `unit_price × quantity` at the stored precision
    pub fn total_price(&self) -> Option<Decimal> {
        self.unit_price.map(|p| round_quantity(p * self.quantity))
    }
}

/// Goods taken out of stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consumption {
    pub id: i64,
    pub item_id: i64,
    pub batch_id: Option<i64>,
    /// Consuming area, e.g. `PRODUCCION`
    pub area: String,
    pub consumed_on: NaiveDate,
    pub quantity: Decimal,
    pub status: ConsumptionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumptionStatus {
    Pending,
    #[default]
    Confirmed,
    /// Drawn through a weighing registration
    Weighed,
    Cancelled,
}

impl ConsumptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionStatus::Pending => "PENDING",
            ConsumptionStatus::Confirmed => "CONFIRMED",
            ConsumptionStatus::Weighed => "WEIGHED",
            ConsumptionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ConsumptionStatus::Pending),
            "CONFIRMED" => Some(ConsumptionStatus::Confirmed),
            "WEIGHED" => Some(ConsumptionStatus::Weighed),
            "CANCELLED" => Some(ConsumptionStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewConsumption {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub area: String,
    pub consumed_on: NaiveDate,
    pub quantity: Decimal,
    pub status: ConsumptionStatus,
}
