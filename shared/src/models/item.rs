//! Master data read by the ledger (items, warehouses, supplier links)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A material/supply tracked by the system (insumo)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: i64,
    /// Legacy catalogue code
    pub code: Option<String>,
    pub name: String,
    pub class_id: Option<String>,
    pub unit_id: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// A physical storage location (almacen)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

/// Agreement between an item and one of its suppliers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSupplier {
    pub id: i64,
    pub item_id: i64,
    pub supplier_id: i64,
    pub unit_price: Option<Decimal>,
}
