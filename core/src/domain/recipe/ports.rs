use std::future::Future;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    recipe::{
        entities::{MenuItemRecipe, PriceCalculation},
        value_objects::{CreateRecipeInput, GetRecipesFilter, RecomputeReport, UpdateRecipeInput},
    },
};

/// Repository trait for recipes
#[cfg_attr(test, mockall::automock)]
pub trait RecipeRepository: Send + Sync {
    /// Persist a new recipe
    fn create(
        &self,
        recipe: MenuItemRecipe,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// Get a recipe by ID
    fn get_by_id(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = Result<Option<MenuItemRecipe>, CoreError>> + Send;

    /// List recipes matching the filter
    fn list(
        &self,
        filter: GetRecipesFilter,
    ) -> impl Future<Output = Result<Vec<MenuItemRecipe>, CoreError>> + Send;

    /// Overwrite a stored recipe
    fn update(
        &self,
        recipe: MenuItemRecipe,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// Recipes with at least one usage of the ingredient.
    fn find_by_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<Vec<MenuItemRecipe>, CoreError>> + Send;

    /// Flags the recipes stale and stamps `stale_marked_at`. Returns how many were found.
    fn mark_stale(
        &self,
        recipe_ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<usize, CoreError>> + Send;
}

/// Append-only store of calculation receipts
#[cfg_attr(test, mockall::automock)]
pub trait PriceCalculationRepository: Send + Sync {
    /// Store a calculation receipt
    fn create(
        &self,
        calculation: PriceCalculation,
    ) -> impl Future<Output = Result<PriceCalculation, CoreError>> + Send;

    /// Newest first.
    fn list_by_recipe(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = Result<Vec<PriceCalculation>, CoreError>> + Send;
}

/// Service trait for recipe costing
pub trait RecipeService: Send + Sync {
    /// Snapshot live ingredient prices and cost a new recipe
    fn create_recipe(
        &self,
        input: CreateRecipeInput,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// Get a recipe by ID
    fn get_recipe(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// List recipes, optionally only stale ones
    fn list_recipes(
        &self,
        filter: GetRecipesFilter,
    ) -> impl Future<Output = Result<Vec<MenuItemRecipe>, CoreError>> + Send;

    /// Edit a recipe; costing changes re-snapshot every line
    fn update_recipe(
        &self,
        recipe_id: Uuid,
        input: UpdateRecipeInput,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// Refreshes every unit price from the live ingredients and costs the recipe again.
    fn recalculate_recipe(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = Result<PriceCalculation, CoreError>> + Send;

    /// Recalculates every stale recipe, skipping ones already being recomputed.
    fn recompute_stale_recipes(&self) -> impl Future<Output = Result<RecomputeReport, CoreError>> + Send;

    /// `None` clears the manual price. Never touches the suggested price.
    fn set_actual_selling_price(
        &self,
        recipe_id: Uuid,
        price: Option<Decimal>,
    ) -> impl Future<Output = Result<MenuItemRecipe, CoreError>> + Send;

    /// Calculation receipts of a recipe, newest first
    fn get_calculations(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = Result<Vec<PriceCalculation>, CoreError>> + Send;
}
