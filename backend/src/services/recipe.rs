//! Recipe expansion, feasibility simulation and execution

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    apply_draws, available_quantity, plan_fifo, round_quantity, validate_area, ConsumptionStatus,
    Draw, LineFilter, Recipe, Requirement, StockLine,
};

use super::allocation::{plan_error, AllocationRequest};
use super::journal::{consume, ConsumptionResult};
use super::{check_quantity, retry_on_conflict};
use crate::config::LedgerConfig;
use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, UnitOfWork};

/// Feasibility of one recipe ingredient
#[derive(Debug, Clone, Serialize)]
pub struct IngredientReport {
    pub position: i32,
    pub item_id: i64,
    pub item_name: String,
    pub proportion: Decimal,
    pub required: Decimal,
    /// Stock left for this line after earlier lines of the same run
    pub available: Decimal,
    pub shortfall: Decimal,
    pub sufficient: bool,
    /// Draws an execution would make right now
    pub planned_draws: Vec<Draw>,
    pub unit_price: Option<Decimal>,
    pub estimated_cost: Option<Decimal>,
}

/// Result of simulating a production run
#[derive(Debug, Clone, Serialize)]
pub struct FeasibilityReport {
    pub recipe_id: i64,
    pub recipe_name: String,
    pub multiplier: Decimal,
    pub feasible: bool,
    pub ingredients: Vec<IngredientReport>,
    pub total_estimated_cost: Decimal,
}

/// Recipe expander service
#[derive(Clone)]
pub struct RecipeExpander<S> {
    store: S,
    settings: LedgerConfig,
}

async fn load_recipe<U: UnitOfWork>(tx: &mut U, recipe_id: i64) -> AppResult<Recipe> {
    let recipe = tx
        .recipe(recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;
    Ok(recipe)
}

impl<S: InventoryStore> RecipeExpander<S> {
    pub fn new(store: S, settings: LedgerConfig) -> Self {
        Self { store, settings }
    }

    /// Per-ingredient quantities for `multiplier` produced units
    pub async fn required_quantities(
        &self,
        recipe_id: i64,
        multiplier: Decimal,
    ) -> AppResult<Vec<Requirement>> {
        check_quantity("multiplier", multiplier)?;

        let mut tx = self.store.begin().await?;
        let recipe = load_recipe(&mut tx, recipe_id).await?;
        Ok(recipe.required_quantities(multiplier)?)
    }

    /// Check whether a production run could be executed, without changing
    /// anything.
    ///
    /// Ingredients are planned in line order against one snapshot, so an item
    /// listed twice only sees what the earlier line left.
    pub async fn simulate(&self, recipe_id: i64, multiplier: Decimal) -> AppResult<FeasibilityReport> {
        check_quantity("multiplier", multiplier)?;

        let mut tx = self.store.begin().await?;
        let recipe = load_recipe(&mut tx, recipe_id).await?;
        let requirements = recipe.required_quantities(multiplier)?;

        let mut residual: HashMap<i64, Vec<StockLine>> = HashMap::new();
        let mut ingredients = Vec::with_capacity(requirements.len());
        for req in requirements {
            let item = tx
                .item(req.item_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

            let lines = match residual.entry(req.item_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(tx.list_lines(LineFilter::item(req.item_id)).await?),
            };
            let available = available_quantity(lines.iter());
            let wanted = req.quantity.min(available);
            let planned_draws = if wanted > Decimal::ZERO {
                let plan = plan_fifo(lines.as_slice(), wanted)
                    .map_err(|e| plan_error(req.item_id, e))?;
                apply_draws(lines, &plan.draws);
                plan.draws
            } else {
                Vec::new()
            };
            let shortfall = (req.quantity - available).max(Decimal::ZERO);

            ingredients.push(IngredientReport {
                position: req.position,
                item_id: item.id,
                item_name: item.name,
                proportion: req.proportion,
                required: req.quantity,
                available,
                shortfall,
                sufficient: shortfall == Decimal::ZERO,
                planned_draws,
                unit_price: item.unit_price,
                estimated_cost: item.unit_price.map(|p| round_quantity(p * req.quantity)),
            });
        }

        let feasible = ingredients.iter().all(|i| i.sufficient);
        let total_estimated_cost: Decimal = ingredients.iter().filter_map(|i| i.estimated_cost).sum();

        tracing::debug!(
            "Simulated recipe {} x{}: feasible={}",
            recipe.id,
            multiplier,
            feasible
        );

        Ok(FeasibilityReport {
            recipe_id: recipe.id,
            recipe_name: recipe.name,
            multiplier,
            feasible,
            ingredients,
            total_estimated_cost,
        })
    }

    /// Consume every ingredient for `multiplier` produced units, all or nothing
    pub async fn execute(
        &self,
        recipe_id: i64,
        multiplier: Decimal,
        area: Option<String>,
    ) -> AppResult<Vec<ConsumptionResult>> {
        let area = area
            .map(|a| a.trim().to_string())
            .unwrap_or_else(|| self.settings.default_area.clone());
        validate_area(&area).map_err(|msg| AppError::validation("area", msg, "Área inválida"))?;
        check_quantity("multiplier", multiplier)?;

        retry_on_conflict(self.settings.conflict_retries, "execute_recipe", move || {
            self.execute_once(recipe_id, multiplier, area.clone())
        })
        .await
    }

    async fn execute_once(
        &self,
        recipe_id: i64,
        multiplier: Decimal,
        area: String,
    ) -> AppResult<Vec<ConsumptionResult>> {
        let mut tx = self.store.begin().await?;
        let recipe = load_recipe(&mut tx, recipe_id).await?;
        let requirements = recipe.required_quantities(multiplier)?;
        let today = Utc::now().date_naive();

        let mut results = Vec::with_capacity(requirements.len());
        for req in requirements {
            if tx.item(req.item_id).await?.is_none() {
                tracing::warn!(
                    "Recipe {} references missing item {}",
                    recipe.id,
                    req.item_id
                );
                return Err(AppError::NotFound("Item".to_string()));
            }

            let result = consume(
                &mut tx,
                AllocationRequest::item(req.item_id, req.quantity),
                area.clone(),
                today,
                ConsumptionStatus::default(),
            )
            .await;

            match result {
                Ok(consumed) => results.push(consumed),
                Err(err) => {
                    tracing::warn!(
                        "Recipe {} x{} aborted at item {}: {}",
                        recipe.id,
                        multiplier,
                        req.item_id,
                        err
                    );
                    return Err(err);
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Executed recipe {} x{}: {} consumption(s) in {}",
            recipe.id,
            multiplier,
            results.len(),
            area
        );
        Ok(results)
    }
}
