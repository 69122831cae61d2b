use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    ingredient::entities::{Ingredient, PriceSource},
    price_ledger::entities::{PriceAlert, PriceHistory},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPriceInput {
    pub ingredient_id: Uuid,
    pub price: Decimal,
    pub source: PriceSource,
    pub recorded_at: DateTime<Utc>,
    pub market_name: Option<String>,
    pub notes: Option<String>,
}

impl RecordPriceInput {
    pub fn new(
        ingredient_id: Uuid,
        price: Decimal,
        source: PriceSource,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ingredient_id,
            price,
            source,
            recorded_at,
            market_name: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPriceOutcome {
    pub history: PriceHistory,
    pub ingredient: Ingredient,
    /// Whether the observation replaced the ingredient's live price.
    pub applied: bool,
    pub alert: Option<PriceAlert>,
}

/// Inclusive `recorded_at` window; open on a side when the bound is `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl HistoryRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(CoreError::validation(
                "history range start must not be after its end",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub ingredient_id: Uuid,
    pub count: u64,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub average_price: Option<Decimal>,
    pub first_price: Option<Decimal>,
    pub latest_price: Option<Decimal>,
    /// Change from the first to the latest price in the window.
    pub net_change_percentage: Option<Decimal>,
}
