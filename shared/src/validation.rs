//! Validation utilities for ledger inputs

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places stored for quantities and prices
pub const QUANTITY_SCALE: u32 = 4;

/// Longest area name accepted on a consumption
pub const MAX_AREA_LEN: usize = 50;

/// Whether `value` is stored as-is, without rounding
pub fn fits_quantity_scale(value: Decimal) -> bool {
    value.normalize().scale() <= QUANTITY_SCALE
}

/// Round a computed quantity or price to the stored precision.
///
/// Midpoints round away from zero, as the database does.
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a consuming area name
pub fn validate_area(area: &str) -> Result<(), &'static str> {
    let trimmed = area.trim();
    if trimmed.is_empty() {
        return Err("Area cannot be empty");
    }
    if trimmed.chars().count() > MAX_AREA_LEN {
        return Err("Area name is too long");
    }
    Ok(())
}

/// Validate that a transfer moves stock between two different warehouses
pub fn validate_transfer_route(origin_id: i64, dest_id: i64) -> Result<(), &'static str> {
    if origin_id == dest_id {
        return Err("Origin and destination warehouses must differ");
    }
    Ok(())
}

/// Validate an expiration look-ahead window in days
pub fn validate_window_days(days: i64) -> Result<(), &'static str> {
    if !(1..=366).contains(&days) {
        return Err("Window must be between 1 and 366 days");
    }
    Ok(())
}
