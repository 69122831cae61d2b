use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    ingredient::{entities::Ingredient, ports::IngredientRepository, value_objects::GetIngredientsFilter},
};

#[derive(Debug, Default)]
pub struct InMemoryIngredientRepository {
    ingredients: RwLock<HashMap<Uuid, Ingredient>>,
}

impl InMemoryIngredientRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IngredientRepository for InMemoryIngredientRepository {
    async fn create(&self, ingredient: Ingredient) -> Result<Ingredient, CoreError> {
        let mut ingredients = self.ingredients.write().await;

        if ingredients.contains_key(&ingredient.id) {
            error!(ingredient_id = %ingredient.id, "Duplicate ingredient id");
            return Err(CoreError::InternalServerError);
        }

        ingredients.insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    async fn get_by_id(&self, ingredient_id: Uuid) -> Result<Option<Ingredient>, CoreError> {
        Ok(self.ingredients.read().await.get(&ingredient_id).cloned())
    }

    async fn list(&self, filter: GetIngredientsFilter) -> Result<Vec<Ingredient>, CoreError> {
        let ingredients = self.ingredients.read().await;

        let mut matching: Vec<Ingredient> = ingredients
            .values()
            .filter(|ingredient| filter.include_inactive || ingredient.is_active)
            .filter(|ingredient| {
                filter
                    .category
                    .is_none_or(|category| ingredient.category == category)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(matching)
    }

    async fn update(&self, ingredient: Ingredient) -> Result<Ingredient, CoreError> {
        let mut ingredients = self.ingredients.write().await;

        let slot = ingredients
            .get_mut(&ingredient.id)
            .ok_or(CoreError::NotFound)?;
        *slot = ingredient.clone();

        Ok(ingredient)
    }

    async fn delete(&self, ingredient_id: Uuid) -> Result<(), CoreError> {
        self.ingredients
            .write()
            .await
            .remove(&ingredient_id)
            .map(|_| ())
            .ok_or(CoreError::NotFound)
    }
}
