//! Stock availability queries

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{round_quantity, Item, LineFilter, StockLevel, StockLevelPolicy};

use super::{check_quantity, ledger};
use crate::error::{AppError, AppResult};
use crate::store::{InventoryStore, UnitOfWork};

#[derive(Debug, Clone, Serialize)]
pub struct AvailableStock {
    pub item_id: i64,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub available: Decimal,
}

/// One stock line at or below the low-stock minimum
#[derive(Debug, Clone, Serialize)]
pub struct LowStockLine {
    pub line_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub batch_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub quantity: Decimal,
    pub entered_at: DateTime<Utc>,
    /// `quantity × unit_price` when the item is priced
    pub value: Option<Decimal>,
    pub level: StockLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct LowStockReport {
    pub minimum: Decimal,
    pub total: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub value_at_risk: Decimal,
    /// Smallest quantity first
    pub lines: Vec<LowStockLine>,
}

#[derive(Clone)]
pub struct StockQuery<S> {
    store: S,
    levels: StockLevelPolicy,
}

impl<S: InventoryStore> StockQuery<S> {
    pub fn new(store: S, levels: StockLevelPolicy) -> Self {
        Self { store, levels }
    }

    /// Stock of an item, optionally narrowed to one batch and/or warehouse
    pub async fn available(
        &self,
        item_id: i64,
        batch_id: Option<i64>,
        warehouse_id: Option<i64>,
    ) -> AppResult<AvailableStock> {
        let mut tx = self.store.begin().await?;

        tx.item(item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item".to_string()))?;

        let available = ledger::available_quantity(
            &mut tx,
            LineFilter {
                item_id,
                batch_id,
                warehouse_id,
            },
        )
        .await?;

        Ok(AvailableStock {
            item_id,
            batch_id,
            warehouse_id,
            available,
        })
    }

    /// Stock lines holding some stock but no more than `minimum`, graded by
    /// urgency
    pub async fn low_stock(&self, minimum: Option<Decimal>) -> AppResult<LowStockReport> {
        let minimum = minimum.unwrap_or(self.levels.default_minimum);
        check_quantity("minimum", minimum)?;

        let mut tx = self.store.begin().await?;
        let stock_lines = tx.low_stock_lines(minimum).await?;

        let mut items: HashMap<i64, Item> = HashMap::new();
        let mut lines = Vec::with_capacity(stock_lines.len());
        for line in stock_lines {
            let item = match items.entry(line.item_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    let item = tx.item(line.item_id).await?.ok_or_else(|| {
                        tracing::error!(
                            "Stock line {} references missing item {}",
                            line.id,
                            line.item_id
                        );
                        AppError::NotFound("Item".to_string())
                    })?;
                    e.insert(item)
                }
            };

            lines.push(LowStockLine {
                line_id: line.id,
                item_id: line.item_id,
                item_name: item.name.clone(),
                batch_id: line.batch_id,
                warehouse_id: line.warehouse_id,
                quantity: line.quantity,
                entered_at: line.entered_at,
                value: item.unit_price.map(|p| round_quantity(p * line.quantity)),
                level: self.levels.classify(line.quantity),
            });
        }

        let count = |level| lines.iter().filter(|l| l.level == level).count();
        let critical_count = count(StockLevel::Critical);
        let high_count = count(StockLevel::High);
        let value_at_risk = lines.iter().filter_map(|l| l.value).sum();

        tracing::debug!(
            "Low stock at or below {}: {} line(s), {} critical",
            minimum,
            lines.len(),
            critical_count
        );

        Ok(LowStockReport {
            minimum,
            total: lines.len(),
            critical_count,
            high_count,
            value_at_risk,
            lines,
        })
    }
}
