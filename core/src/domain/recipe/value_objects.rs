use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{common::entities::app_errors::CoreError, recipe::entities::OverheadCosts, unit::value_objects::Unit};

/// A recipe line as entered; the unit price is snapshotted from the ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredientInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub unit: Unit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipeInput {
    pub name: String,
    pub menu_item_id: Option<Uuid>,
    pub ingredients: Vec<RecipeIngredientInput>,
    pub overhead_costs: OverheadCosts,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecipeInput {
    pub name: Option<String>,
    pub menu_item_id: Option<Uuid>,
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
    pub overhead_costs: Option<OverheadCosts>,
    pub profit_margin: Option<Decimal>,
}

impl UpdateRecipeInput {
    /// Whether the change touches anything the cost calculation reads.
    pub fn changes_costing(&self) -> bool {
        self.ingredients.is_some() || self.overhead_costs.is_some() || self.profit_margin.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetRecipesFilter {
    pub stale_only: bool,
    pub menu_item_id: Option<Uuid>,
}

/// Result of one pass over stale recipes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    pub recomputed: Vec<Uuid>,
    /// Recipes another recompute was already working on.
    pub in_flight: Vec<Uuid>,
    pub failed: Vec<(Uuid, CoreError)>,
}
