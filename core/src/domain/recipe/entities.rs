use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::{generate_timestamp, percentage_change, round_percentage},
    unit::value_objects::Unit,
};

/// One ingredient line of a recipe.
///
/// `unit_price` is a frozen copy of the ingredient's market price per `price_unit`,
/// taken when the recipe was last costed. It is never resolved against the live
/// ingredient at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientUsage {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity: Decimal,
    pub unit: Unit,
    pub price_unit: Unit,
    pub unit_price: Decimal,
    pub total_cost: Decimal,
}

/// Per-item overhead, already allocated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverheadCosts {
    pub labour_charge: Decimal,
    pub rent_allocation: Decimal,
    pub electricity_charge: Decimal,
    pub wastage_percentage: Decimal,
    pub miscellaneous: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadBreakdown {
    pub labour_charge: Decimal,
    pub rent_allocation: Decimal,
    pub electricity_charge: Decimal,
    pub wastage_percentage: Decimal,
    pub wastage_amount: Decimal,
    pub miscellaneous: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub ingredients: Vec<IngredientUsage>,
    pub overhead: OverheadBreakdown,
    pub total_ingredient_cost: Decimal,
    pub total_overhead_cost: Decimal,
    pub total_making_cost: Decimal,
    pub profit_margin: Decimal,
    pub profit_amount: Decimal,
    pub suggested_selling_price: Decimal,
}

/// Immutable receipt of one costing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculation {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub breakdown: CostBreakdown,
    pub calculated_at: DateTime<Utc>,
}

impl PriceCalculation {
    pub fn new(recipe_id: Uuid, menu_item_id: Option<Uuid>, breakdown: CostBreakdown) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            recipe_id,
            menu_item_id,
            breakdown,
            calculated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItemRecipe {
    pub id: Uuid,
    pub menu_item_id: Option<Uuid>,
    pub name: String,
    pub ingredients: Vec<IngredientUsage>,
    pub overhead_costs: OverheadCosts,
    pub total_ingredient_cost: Decimal,
    pub total_overhead_cost: Decimal,
    pub total_making_cost: Decimal,
    pub profit_margin: Decimal,
    pub suggested_selling_price: Decimal,
    pub actual_selling_price: Option<Decimal>,
    pub is_stale: bool,
    pub stale_marked_at: Option<DateTime<Utc>>,
    pub last_calculated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RecipeConfig {
    pub name: String,
    pub menu_item_id: Option<Uuid>,
    pub ingredients: Vec<IngredientUsage>,
    pub overhead_costs: OverheadCosts,
    pub profit_margin: Decimal,
}

impl MenuItemRecipe {
    /// A recipe that has not been costed yet; derived totals are zero until
    /// [`apply_calculation`](Self::apply_calculation).
    pub fn new(config: RecipeConfig) -> Self {
        let (now, timestamp) = generate_timestamp();

        Self {
            id: Uuid::new_v7(timestamp),
            menu_item_id: config.menu_item_id,
            name: config.name,
            ingredients: config.ingredients,
            overhead_costs: config.overhead_costs,
            total_ingredient_cost: Decimal::ZERO,
            total_overhead_cost: Decimal::ZERO,
            total_making_cost: Decimal::ZERO,
            profit_margin: config.profit_margin,
            suggested_selling_price: Decimal::ZERO,
            actual_selling_price: None,
            is_stale: false,
            stale_marked_at: None,
            last_calculated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Writes every derived field from one calculation. The only writer of those fields.
    pub fn apply_calculation(&mut self, calculation: &PriceCalculation) {
        let breakdown = &calculation.breakdown;

        self.ingredients = breakdown.ingredients.clone();
        self.total_ingredient_cost = breakdown.total_ingredient_cost;
        self.total_overhead_cost = breakdown.total_overhead_cost;
        self.total_making_cost = breakdown.total_making_cost;
        self.profit_margin = breakdown.profit_margin;
        self.suggested_selling_price = breakdown.suggested_selling_price;
        self.is_stale = false;
        self.last_calculated_at = Some(calculation.calculated_at);
        self.updated_at = Utc::now();
    }

    pub fn references(&self, ingredient_id: Uuid) -> bool {
        self.ingredients
            .iter()
            .any(|usage| usage.ingredient_id == ingredient_id)
    }

    /// Margin realized by the manual selling price, if one is set.
    pub fn achieved_margin(&self) -> Option<Decimal> {
        let actual = self.actual_selling_price?;
        percentage_change(self.total_making_cost, actual).map(round_percentage)
    }
}
