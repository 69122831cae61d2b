use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    recipe::{entities::MenuItemRecipe, ports::RecipeRepository, value_objects::GetRecipesFilter},
};

#[derive(Debug, Default)]
pub struct InMemoryRecipeRepository {
    recipes: RwLock<HashMap<Uuid, MenuItemRecipe>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut recipes: Vec<MenuItemRecipe>) -> Vec<MenuItemRecipe> {
    recipes.sort_by_key(|recipe| (recipe.created_at, recipe.id));
    recipes
}

impl RecipeRepository for InMemoryRecipeRepository {
    async fn create(&self, recipe: MenuItemRecipe) -> Result<MenuItemRecipe, CoreError> {
        let mut recipes = self.recipes.write().await;

        if recipes.contains_key(&recipe.id) {
            error!(recipe_id = %recipe.id, "Duplicate recipe id");
            return Err(CoreError::InternalServerError);
        }

        recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn get_by_id(&self, recipe_id: Uuid) -> Result<Option<MenuItemRecipe>, CoreError> {
        Ok(self.recipes.read().await.get(&recipe_id).cloned())
    }

    async fn list(&self, filter: GetRecipesFilter) -> Result<Vec<MenuItemRecipe>, CoreError> {
        let recipes = self.recipes.read().await;

        Ok(sorted(
            recipes
                .values()
                .filter(|recipe| !filter.stale_only || recipe.is_stale)
                .filter(|recipe| {
                    filter
                        .menu_item_id
                        .is_none_or(|menu_item_id| recipe.menu_item_id == Some(menu_item_id))
                })
                .cloned()
                .collect(),
        ))
    }

    async fn update(&self, recipe: MenuItemRecipe) -> Result<MenuItemRecipe, CoreError> {
        let mut recipes = self.recipes.write().await;

        let slot = recipes.get_mut(&recipe.id).ok_or(CoreError::NotFound)?;
        *slot = recipe.clone();

        Ok(recipe)
    }

    async fn find_by_ingredient(&self, ingredient_id: Uuid) -> Result<Vec<MenuItemRecipe>, CoreError> {
        let recipes = self.recipes.read().await;

        Ok(sorted(
            recipes
                .values()
                .filter(|recipe| recipe.references(ingredient_id))
                .cloned()
                .collect(),
        ))
    }

    async fn mark_stale(&self, recipe_ids: Vec<Uuid>) -> Result<usize, CoreError> {
        let mut recipes = self.recipes.write().await;
        let now = Utc::now();

        let mut marked = 0;
        for recipe_id in recipe_ids {
            if let Some(recipe) = recipes.get_mut(&recipe_id) {
                recipe.is_stale = true;
                recipe.stale_marked_at = Some(now);
                marked += 1;
            }
        }

        Ok(marked)
    }
}
