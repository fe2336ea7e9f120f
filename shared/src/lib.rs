//! Shared types and algorithms for the warehouse inventory ledger
//!
//! This crate holds the domain model and the pure parts of the ledger
//! (FIFO draw planning, expiration classification, recipe expansion).
//! It performs no I/O; the backend drives it from inside a unit of work.

pub mod allocation;
pub mod models;
pub mod validation;

pub use allocation::*;
pub use models::*;
pub use validation::*;
