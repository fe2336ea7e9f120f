//! Recipe (bill of materials) templates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::round_quantity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    /// Ordered by `position`
    pub lines: Vec<RecipeLine>,
}

/// One ingredient of a recipe, per produced unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeLine {
    pub position: i32,
    pub item_id: i64,
    pub proportion: Decimal,
    /// Measure kind, e.g. `KG`, `UND`
    pub measure: Option<String>,
}

/// Quantity of one ingredient needed for a production run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requirement {
    pub position: i32,
    pub item_id: i64,
    pub proportion: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecipeError {
    #[error("recipe {0} has no lines")]
    Empty(i64),

    #[error("multiplier must be positive, got {0}")]
    NonPositiveMultiplier(Decimal),

    #[error("proportion for item {item_id} must be positive, got {proportion}")]
    NonPositiveProportion { item_id: i64, proportion: Decimal },

    #[error("quantity {quantity} for item {item_id} rounds to zero")]
    BelowPrecision { item_id: i64, quantity: Decimal },
}

impl Recipe {
    /// Expand the recipe for `multiplier` produced units, in line order.
    ///
    /// Quantities are rounded to the stored precision.
    pub fn required_quantities(&self, multiplier: Decimal) -> Result<Vec<Requirement>, RecipeError> {
        if self.lines.is_empty() {
            return Err(RecipeError::Empty(self.id));
        }
        if multiplier <= Decimal::ZERO {
            return Err(RecipeError::NonPositiveMultiplier(multiplier));
        }

        let mut lines: Vec<&RecipeLine> = self.lines.iter().collect();
        lines.sort_by_key(|l| l.position);

        lines
            .into_iter()
            .map(|line| {
                if line.proportion <= Decimal::ZERO {
                    return Err(RecipeError::NonPositiveProportion {
                        item_id: line.item_id,
                        proportion: line.proportion,
                    });
                }
                let exact = line.proportion * multiplier;
                let quantity = round_quantity(exact);
                if quantity <= Decimal::ZERO {
                    return Err(RecipeError::BelowPrecision {
                        item_id: line.item_id,
                        quantity: exact,
                    });
                }
                Ok(Requirement {
                    position: line.position,
                    item_id: line.item_id,
                    proportion: line.proportion,
                    quantity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn recipe(lines: &[(i32, i64, &str)]) -> Recipe {
        Recipe {
            id: 9,
            name: "Blend".to_string(),
            lines: lines
                .iter()
                .map(|(position, item_id, proportion)| RecipeLine {
                    position: *position,
                    item_id: *item_id,
                    proportion: dec(proportion),
                    measure: Some("KG".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_required_quantities_scale_by_multiplier() {
        let r = recipe(&[(1, 10, "2"), (2, 20, "5")]);
        let req = r.required_quantities(dec("3")).unwrap();
        assert_eq!(req.len(), 2);
        assert_eq!((req[0].item_id, req[0].quantity), (10, dec("6")));
        assert_eq!((req[1].item_id, req[1].quantity), (20, dec("15")));
    }

    #[test]
    fn test_required_quantities_follow_position() {
        let r = recipe(&[(2, 20, "1"), (1, 10, "0.5")]);
        let req = r.required_quantities(dec("2")).unwrap();
        let items: Vec<i64> = req.iter().map(|r| r.item_id).collect();
        assert_eq!(items, vec![10, 20]);
        assert_eq!(req[0].quantity, dec("1.0"));
    }

    #[test]
    fn test_required_quantities_round_to_stored_precision() {
        let r = recipe(&[(1, 10, "0.0001"), (2, 20, "0.3333")]);
        let req = r.required_quantities(dec("1.5")).unwrap();
        assert_eq!(req[0].quantity, dec("0.0002"));
        assert_eq!(req[1].quantity, dec("0.5000"));

        let tiny = recipe(&[(1, 10, "0.0001")]);
        assert!(matches!(
            tiny.required_quantities(dec("0.1")),
            Err(RecipeError::BelowPrecision { item_id: 10, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let r = recipe(&[(1, 10, "2")]);
        assert_eq!(
            r.required_quantities(Decimal::ZERO),
            Err(RecipeError::NonPositiveMultiplier(Decimal::ZERO))
        );

        let zero = recipe(&[(1, 10, "2"), (2, 11, "0")]);
        assert!(matches!(
            zero.required_quantities(Decimal::ONE),
            Err(RecipeError::NonPositiveProportion { item_id: 11, .. })
        ));

        let empty = recipe(&[]);
        assert_eq!(empty.required_quantities(Decimal::ONE), Err(RecipeError::Empty(9)));
    }
}
