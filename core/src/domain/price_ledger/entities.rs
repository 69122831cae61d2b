use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::generate_timestamp, ingredient::entities::PriceSource, unit::value_objects::Unit,
};

/// One observed price. Records are append-only and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    /// Position in the ingredient's log, starting at 0.
    pub sequence: u64,
    pub price: Decimal,
    pub unit: Unit,
    pub source: PriceSource,
    pub market_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    /// Relative to the preceding record; `None` for the first one.
    pub change_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PriceHistoryConfig {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub sequence: u64,
    pub price: Decimal,
    pub unit: Unit,
    pub source: PriceSource,
    pub market_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub change_percentage: Option<Decimal>,
    pub notes: Option<String>,
}

impl PriceHistory {
    pub fn new(config: PriceHistoryConfig) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            ingredient_id: config.ingredient_id,
            ingredient_name: config.ingredient_name,
            sequence: config.sequence,
            price: config.price,
            unit: config.unit,
            source: config.source,
            market_name: config.market_name,
            recorded_at: config.recorded_at,
            change_percentage: config.change_percentage,
            notes: config.notes,
            created_at: now,
        }
    }
}

/// Raised when a price moves by at least the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub change_percentage: Decimal,
    pub recorded_at: DateTime<Utc>,
}
