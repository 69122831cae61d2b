use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ingredient::entities::{IngredientCategory, PriceSource},
    unit::value_objects::Unit,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub category: IngredientCategory,
    pub market_price: Decimal,
    pub unit: Unit,
    pub price_source: PriceSource,
    pub auto_update_enabled: bool,
}

/// Live price changes go through the price ledger, never through this input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub category: Option<IngredientCategory>,
    pub unit: Option<Unit>,
    pub auto_update_enabled: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GetIngredientsFilter {
    pub category: Option<IngredientCategory>,
    pub include_inactive: bool,
}
