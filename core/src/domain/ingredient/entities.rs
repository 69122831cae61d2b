use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, generate_timestamp},
    unit::value_objects::Unit,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCategory {
    Vegetables,
    Spices,
    Dairy,
    Meat,
    Grains,
    Oils,
    Beverages,
    Others,
}

impl IngredientCategory {
    pub const ALL: [IngredientCategory; 8] = [
        IngredientCategory::Vegetables,
        IngredientCategory::Spices,
        IngredientCategory::Dairy,
        IngredientCategory::Meat,
        IngredientCategory::Grains,
        IngredientCategory::Oils,
        IngredientCategory::Beverages,
        IngredientCategory::Others,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Manual,
    Agmarknet,
    Scraped,
    Api,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub category: IngredientCategory,
    pub market_price: Decimal,
    pub unit: Unit,
    pub price_source: PriceSource,
    pub auto_update_enabled: bool,
    pub last_price_fetch: Option<DateTime<Utc>>,
    pub previous_price: Option<Decimal>,
    pub price_change_percentage: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IngredientConfig {
    pub name: String,
    pub category: IngredientCategory,
    pub market_price: Decimal,
    pub unit: Unit,
    pub price_source: PriceSource,
    pub auto_update_enabled: bool,
}

impl Ingredient {
    pub fn new(config: IngredientConfig) -> Result<Self, CoreError> {
        let name = config.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation("ingredient name must not be empty"));
        }
        if config.market_price <= Decimal::ZERO {
            return Err(CoreError::validation("market price must be positive"));
        }

        let (now, timestamp) = generate_timestamp();

        Ok(Self {
            id: Uuid::new_v7(timestamp),
            name,
            category: config.category,
            market_price: config.market_price,
            unit: config.unit,
            price_source: config.price_source,
            auto_update_enabled: config.auto_update_enabled,
            last_price_fetch: None,
            previous_price: None,
            price_change_percentage: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Overlays a recorded observation onto the live price.
    pub fn apply_price(
        &mut self,
        price: Decimal,
        change_percentage: Option<Decimal>,
        source: PriceSource,
        fetched_at: DateTime<Utc>,
    ) {
        self.previous_price = Some(self.market_price);
        self.market_price = price;
        self.price_change_percentage = change_percentage;
        self.price_source = source;
        self.last_price_fetch = Some(fetched_at);
        self.updated_at = Utc::now();
    }

    /// Stamps a successful source fetch; never moves the stamp backwards.
    pub fn mark_fetched(&mut self, at: DateTime<Utc>) {
        self.last_price_fetch = Some(self.last_price_fetch.map_or(at, |last| last.max(at)));
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn config(price: Decimal) -> IngredientConfig {
        IngredientConfig {
            name: "  Onion ".to_string(),
            category: IngredientCategory::Vegetables,
            market_price: price,
            unit: Unit::Kg,
            price_source: PriceSource::Manual,
            auto_update_enabled: true,
        }
    }

    #[test]
    fn test_new_trims_name_and_starts_active() {
        let ingredient = Ingredient::new(config(dec!(40))).unwrap();
        assert_eq!(ingredient.name, "Onion");
        assert!(ingredient.is_active);
        assert_eq!(ingredient.last_price_fetch, None);
        assert_eq!(ingredient.previous_price, None);
    }

    #[test]
    fn test_new_rejects_non_positive_price() {
        assert!(matches!(
            Ingredient::new(config(Decimal::ZERO)),
            Err(CoreError::Validation(_))
        ));
        assert!(Ingredient::new(config(dec!(-1))).is_err());
    }

    #[test]
    fn test_apply_price_keeps_previous() {
        let mut ingredient = Ingredient::new(config(dec!(40))).unwrap();
        let at = Utc::now();
        ingredient.apply_price(dec!(50), Some(dec!(25)), PriceSource::Agmarknet, at);

        assert_eq!(ingredient.market_price, dec!(50));
        assert_eq!(ingredient.previous_price, Some(dec!(40)));
        assert_eq!(ingredient.price_change_percentage, Some(dec!(25)));
        assert_eq!(ingredient.price_source, PriceSource::Agmarknet);
        assert_eq!(ingredient.last_price_fetch, Some(at));
    }

    #[test]
    fn test_mark_fetched_never_moves_backwards() {
        let mut ingredient = Ingredient::new(config(dec!(40))).unwrap();
        let now = Utc::now();

        ingredient.mark_fetched(now);
        ingredient.mark_fetched(now - chrono::Duration::hours(3));
        assert_eq!(ingredient.last_price_fetch, Some(now));
        assert_eq!(ingredient.market_price, dec!(40));
    }
}
