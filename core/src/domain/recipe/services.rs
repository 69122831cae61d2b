use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    ingredient::ports::IngredientRepository,
    price_ledger::ports::{AlertNotifier, PriceHistoryRepository},
    price_update::ports::{PriceSettingsRepository, PriceSourceClient},
    recipe::{
        calculator::compute_cost,
        entities::{IngredientUsage, MenuItemRecipe, PriceCalculation, RecipeConfig},
        ports::{PriceCalculationRepository, RecipeRepository, RecipeService},
        value_objects::{
            CreateRecipeInput, GetRecipesFilter, RecipeIngredientInput, RecomputeReport,
            UpdateRecipeInput,
        },
    },
};

impl<I, PH, RE, PC, ST, PS, N> Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
    RE: RecipeRepository,
    PC: PriceCalculationRepository,
{
    async fn snapshot_usage(
        &self,
        input: &RecipeIngredientInput,
    ) -> Result<IngredientUsage, CoreError> {
        let ingredient = self
            .ingredient_repository
            .get_by_id(input.ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        if !ingredient.is_active {
            return Err(CoreError::validation(format!(
                "ingredient {} is inactive",
                ingredient.name
            )));
        }

        Ok(IngredientUsage {
            ingredient_id: ingredient.id,
            ingredient_name: ingredient.name,
            quantity: input.quantity,
            unit: input.unit,
            price_unit: ingredient.unit,
            unit_price: ingredient.market_price,
            total_cost: Decimal::ZERO,
        })
    }

    /// Re-reads the live price; deactivated ingredients keep costing at their last price.
    async fn refresh_usage(&self, usage: &IngredientUsage) -> Result<IngredientUsage, CoreError> {
        let ingredient = self
            .ingredient_repository
            .get_by_id(usage.ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        Ok(IngredientUsage {
            ingredient_name: ingredient.name,
            price_unit: ingredient.unit,
            unit_price: ingredient.market_price,
            ..usage.clone()
        })
    }

    async fn refresh_usages(
        &self,
        usages: &[IngredientUsage],
    ) -> Result<Vec<IngredientUsage>, CoreError> {
        let mut refreshed = Vec::with_capacity(usages.len());
        for usage in usages {
            refreshed.push(self.refresh_usage(usage).await?);
        }
        Ok(refreshed)
    }

    async fn snapshot_usages(
        &self,
        inputs: &[RecipeIngredientInput],
    ) -> Result<Vec<IngredientUsage>, CoreError> {
        let mut usages = Vec::with_capacity(inputs.len());
        for input in inputs {
            usages.push(self.snapshot_usage(input).await?);
        }
        Ok(usages)
    }

    /// Costs an existing recipe, stores the receipt and the recipe. Caller holds the recipe lock.
    async fn store_costing(
        &self,
        mut recipe: MenuItemRecipe,
    ) -> Result<(MenuItemRecipe, PriceCalculation), CoreError> {
        let calculation = compute_cost(&recipe)?;
        let calculation = self.calculation_repository.create(calculation).await?;
        recipe.apply_calculation(&calculation);

        let recipe = self.recipe_repository.update(recipe).await?;
        Ok((recipe, calculation))
    }

    async fn recalculate_locked(&self, recipe_id: Uuid) -> Result<PriceCalculation, CoreError> {
        let mut recipe = self
            .recipe_repository
            .get_by_id(recipe_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        recipe.ingredients = self.refresh_usages(&recipe.ingredients).await?;
        let (recipe, calculation) = self.store_costing(recipe).await?;

        tracing::info!(
            recipe_id = %recipe.id,
            making_cost = %recipe.total_making_cost,
            suggested_price = %recipe.suggested_selling_price,
            "Recipe recalculated"
        );

        Ok(calculation)
    }
}

impl<I, PH, RE, PC, ST, PS, N> RecipeService for Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
    PH: PriceHistoryRepository,
    RE: RecipeRepository,
    PC: PriceCalculationRepository,
    ST: PriceSettingsRepository,
    PS: PriceSourceClient,
    N: AlertNotifier,
{
    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_recipe(&self, input: CreateRecipeInput) -> Result<MenuItemRecipe, CoreError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::validation("recipe name must not be empty"));
        }

        let ingredients = self.snapshot_usages(&input.ingredients).await?;

        let mut recipe = MenuItemRecipe::new(RecipeConfig {
            name,
            menu_item_id: input.menu_item_id,
            ingredients,
            overhead_costs: input.overhead_costs,
            profit_margin: input.profit_margin,
        });

        let calculation = compute_cost(&recipe)?;
        recipe.apply_calculation(&calculation);

        let recipe = self.recipe_repository.create(recipe).await?;
        self.calculation_repository.create(calculation).await?;

        tracing::info!(
            recipe_id = %recipe.id,
            ingredients = recipe.ingredients.len(),
            suggested_price = %recipe.suggested_selling_price,
            "Recipe created"
        );

        Ok(recipe)
    }

    async fn get_recipe(&self, recipe_id: Uuid) -> Result<MenuItemRecipe, CoreError> {
        self.recipe_repository
            .get_by_id(recipe_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    async fn list_recipes(
        &self,
        filter: GetRecipesFilter,
    ) -> Result<Vec<MenuItemRecipe>, CoreError> {
        self.recipe_repository.list(filter).await
    }

    #[instrument(skip(self, input))]
    async fn update_recipe(
        &self,
        recipe_id: Uuid,
        input: UpdateRecipeInput,
    ) -> Result<MenuItemRecipe, CoreError> {
        let _guard = self.recipe_locks.lock(recipe_id).await;

        let mut recipe = self
            .recipe_repository
            .get_by_id(recipe_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        let changes_costing = input.changes_costing();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::validation("recipe name must not be empty"));
            }
            recipe.name = name;
        }
        if let Some(menu_item_id) = input.menu_item_id {
            recipe.menu_item_id = Some(menu_item_id);
        }

        if !changes_costing {
            recipe.updated_at = Utc::now();
            return self.recipe_repository.update(recipe).await;
        }

        // a costing edit prices every line at today's prices
        recipe.ingredients = match input.ingredients {
            Some(lines) => self.snapshot_usages(&lines).await?,
            None => self.refresh_usages(&recipe.ingredients).await?,
        };
        if let Some(overhead_costs) = input.overhead_costs {
            recipe.overhead_costs = overhead_costs;
        }
        if let Some(profit_margin) = input.profit_margin {
            recipe.profit_margin = profit_margin;
        }

        let (recipe, _) = self.store_costing(recipe).await?;

        tracing::info!(
            recipe_id = %recipe.id,
            suggested_price = %recipe.suggested_selling_price,
            "Recipe updated"
        );

        Ok(recipe)
    }

    #[instrument(skip(self))]
    async fn recalculate_recipe(&self, recipe_id: Uuid) -> Result<PriceCalculation, CoreError> {
        let _guard = self.recipe_locks.lock(recipe_id).await;
        self.recalculate_locked(recipe_id).await
    }

    #[instrument(skip(self))]
    async fn recompute_stale_recipes(&self) -> Result<RecomputeReport, CoreError> {
        let stale = self
            .recipe_repository
            .list(GetRecipesFilter {
                stale_only: true,
                ..Default::default()
            })
            .await?;

        let mut report = RecomputeReport::default();

        for recipe in stale {
            let Some(_guard) = self.recipe_locks.try_lock(recipe.id) else {
                tracing::debug!(recipe_id = %recipe.id, "Recompute already in flight, skipping");
                report.in_flight.push(recipe.id);
                continue;
            };

            match self.recalculate_locked(recipe.id).await {
                Ok(_) => report.recomputed.push(recipe.id),
                Err(e) => {
                    tracing::warn!(recipe_id = %recipe.id, error = %e, "Stale recipe recompute failed");
                    report.failed.push((recipe.id, e));
                }
            }
        }

        tracing::info!(
            recomputed = report.recomputed.len(),
            in_flight = report.in_flight.len(),
            failed = report.failed.len(),
            "Stale recipes recomputed"
        );

        Ok(report)
    }

    #[instrument(skip(self))]
    async fn set_actual_selling_price(
        &self,
        recipe_id: Uuid,
        price: Option<Decimal>,
    ) -> Result<MenuItemRecipe, CoreError> {
        if price.is_some_and(|price| price <= Decimal::ZERO) {
            return Err(CoreError::validation("selling price must be positive"));
        }

        let _guard = self.recipe_locks.lock(recipe_id).await;

        let mut recipe = self
            .recipe_repository
            .get_by_id(recipe_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        recipe.actual_selling_price = price;
        recipe.updated_at = Utc::now();

        self.recipe_repository.update(recipe).await
    }

    async fn get_calculations(&self, recipe_id: Uuid) -> Result<Vec<PriceCalculation>, CoreError> {
        self.get_recipe(recipe_id).await?;
        self.calculation_repository.list_by_recipe(recipe_id).await
    }
}
