//! HTTP handlers for the inventory ledger API

pub mod batches;
pub mod consumptions;
pub mod health;
pub mod receipts;
pub mod recipes;
pub mod stock;
pub mod transfers;
pub mod weighings;

pub use batches::{
    get_active_batches, get_batch_classification, get_expired_batches, get_expiring_batches,
};
pub use consumptions::{create_consumption, set_consumption_status};
pub use health::health_check;
pub use receipts::{create_receipt, set_receipt_status};
pub use recipes::{execute_recipe, simulate_recipe};
pub use stock::{get_available_stock, get_low_stock};
pub use transfers::transfer_stock;
pub use weighings::create_weighing;
