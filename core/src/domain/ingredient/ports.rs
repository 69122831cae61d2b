use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    ingredient::{
        entities::Ingredient,
        value_objects::{CreateIngredientInput, GetIngredientsFilter, UpdateIngredientInput},
    },
};

/// Repository trait for ingredients
#[cfg_attr(test, mockall::automock)]
pub trait IngredientRepository: Send + Sync {
    /// Persist a new ingredient
    fn create(
        &self,
        ingredient: Ingredient,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// Get an ingredient by ID
    fn get_by_id(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<Option<Ingredient>, CoreError>> + Send;

    /// List ingredients matching the filter, ordered by name
    fn list(
        &self,
        filter: GetIngredientsFilter,
    ) -> impl Future<Output = Result<Vec<Ingredient>, CoreError>> + Send;

    /// Overwrite a stored ingredient
    fn update(
        &self,
        ingredient: Ingredient,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// Remove an ingredient record
    fn delete(&self, ingredient_id: Uuid) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Service trait for ingredient management
pub trait IngredientService: Send + Sync {
    /// Create an ingredient without adding any price history
    fn create_ingredient(
        &self,
        input: CreateIngredientInput,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// Get an ingredient by ID
    fn get_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// List ingredients, active ones only unless the filter says otherwise
    fn list_ingredients(
        &self,
        filter: GetIngredientsFilter,
    ) -> impl Future<Output = Result<Vec<Ingredient>, CoreError>> + Send;

    /// Fails when the unit changes while a recipe references the ingredient.
    fn update_ingredient(
        &self,
        ingredient_id: Uuid,
        input: UpdateIngredientInput,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// Hide an ingredient from new recipes; existing recipes keep costing it
    fn deactivate_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<Ingredient, CoreError>> + Send;

    /// Hard delete, refused while any recipe references the ingredient.
    fn delete_ingredient(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}
