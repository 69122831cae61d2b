use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    ingredient::{
        entities::{Ingredient, IngredientConfig},
        ports::{IngredientRepository, IngredientService},
        value_objects::{CreateIngredientInput, GetIngredientsFilter, UpdateIngredientInput},
    },
    price_ledger::ports::{AlertNotifier, PriceHistoryRepository},
    price_update::ports::{PriceSettingsRepository, PriceSourceClient},
    recipe::ports::{PriceCalculationRepository, RecipeRepository},
    unit::convert_unit_price,
};

impl<I, PH, RE, PC, ST, PS, N> IngredientService for Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
    PH: PriceHistoryRepository,
    RE: RecipeRepository,
    PC: PriceCalculationRepository,
    ST: PriceSettingsRepository,
    PS: PriceSourceClient,
    N: AlertNotifier,
{
    #[instrument(skip(self), fields(name = %input.name))]
    async fn create_ingredient(&self, input: CreateIngredientInput) -> Result<Ingredient, CoreError> {
        let ingredient = Ingredient::new(IngredientConfig {
            name: input.name,
            category: input.category,
            market_price: input.market_price,
            unit: input.unit,
            price_source: input.price_source,
            auto_update_enabled: input.auto_update_enabled,
        })?;

        let created = self.ingredient_repository.create(ingredient).await?;

        tracing::info!(
            ingredient_id = %created.id,
            unit = %created.unit,
            "Ingredient created"
        );

        Ok(created)
    }

    async fn get_ingredient(&self, ingredient_id: Uuid) -> Result<Ingredient, CoreError> {
        self.ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    async fn list_ingredients(
        &self,
        filter: GetIngredientsFilter,
    ) -> Result<Vec<Ingredient>, CoreError> {
        self.ingredient_repository.list(filter).await
    }

    #[instrument(skip(self, input))]
    async fn update_ingredient(
        &self,
        ingredient_id: Uuid,
        input: UpdateIngredientInput,
    ) -> Result<Ingredient, CoreError> {
        let _guard = self.ingredient_locks.lock(ingredient_id).await;

        let mut ingredient = self
            .ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        if let Some(unit) = input.unit.filter(|unit| *unit != ingredient.unit) {
            let referencing = self
                .recipe_repository
                .find_by_ingredient(ingredient_id)
                .await?;

            if !referencing.is_empty() {
                return Err(CoreError::validation(format!(
                    "unit of ingredient {} cannot change from {} to {} while {} recipe(s) reference it",
                    ingredient.name,
                    ingredient.unit,
                    unit,
                    referencing.len()
                )));
            }

            let from = ingredient.unit;
            ingredient.market_price = convert_unit_price(ingredient.market_price, from, unit)?;
            ingredient.previous_price = ingredient
                .previous_price
                .map(|price| convert_unit_price(price, from, unit))
                .transpose()?;

            tracing::info!(
                ingredient_id = %ingredient.id,
                from = %from,
                to = %unit,
                market_price = %ingredient.market_price,
                "Ingredient unit changed, live price re-expressed"
            );

            ingredient.unit = unit;
        }

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::validation("ingredient name must not be empty"));
            }
            ingredient.name = name;
        }
        if let Some(category) = input.category {
            ingredient.category = category;
        }
        if let Some(auto_update_enabled) = input.auto_update_enabled {
            ingredient.auto_update_enabled = auto_update_enabled;
        }
        if let Some(is_active) = input.is_active {
            ingredient.is_active = is_active;
        }
        ingredient.updated_at = Utc::now();

        self.ingredient_repository.update(ingredient).await
    }

    #[instrument(skip(self))]
    async fn deactivate_ingredient(&self, ingredient_id: Uuid) -> Result<Ingredient, CoreError> {
        let _guard = self.ingredient_locks.lock(ingredient_id).await;

        let mut ingredient = self
            .ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        ingredient.deactivate();
        let ingredient = self.ingredient_repository.update(ingredient).await?;

        tracing::info!(ingredient_id = %ingredient_id, "Ingredient deactivated");

        Ok(ingredient)
    }

    #[instrument(skip(self))]
    async fn delete_ingredient(&self, ingredient_id: Uuid) -> Result<(), CoreError> {
        let _guard = self.ingredient_locks.lock(ingredient_id).await;

        self.ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        let referencing = self
            .recipe_repository
            .find_by_ingredient(ingredient_id)
            .await?;
        if !referencing.is_empty() {
            return Err(CoreError::validation(format!(
                "ingredient is referenced by {} recipe(s); deactivate it instead",
                referencing.len()
            )));
        }

        self.ingredient_repository.delete(ingredient_id).await?;

        tracing::info!(ingredient_id = %ingredient_id, "Ingredient deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        domain::{
            ingredient::entities::{IngredientCategory, PriceSource},
            price_ledger::{
                ports::PriceLedgerService,
                value_objects::{HistoryRange, RecordPriceInput},
            },
            unit::value_objects::Unit,
        },
        test_support::{default_settings, notifier, seed_ingredient, seed_recipe, test_service},
    };

    #[tokio::test]
    async fn test_create_validates_and_adds_no_history() {
        let service = test_service();

        let result = service
            .create_ingredient(CreateIngredientInput {
                name: "Jeera".to_string(),
                category: IngredientCategory::Spices,
                market_price: dec!(0),
                unit: Unit::Kg,
                price_source: PriceSource::Manual,
                auto_update_enabled: false,
            })
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let jeera = seed_ingredient(&service, "Jeera", IngredientCategory::Spices, dec!(450), Unit::Kg).await;
        let history = service
            .get_history(jeera.id, HistoryRange::all())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_unit_is_frozen_once_referenced() {
        let service = test_service();
        let paneer = seed_ingredient(&service, "Paneer", IngredientCategory::Dairy, dec!(320), Unit::Kg).await;

        // unreferenced: the unit may change
        let paneer = service
            .update_ingredient(
                paneer.id,
                UpdateIngredientInput {
                    unit: Some(Unit::Gm),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(paneer.unit, Unit::Gm);

        seed_recipe(&service, "Paneer tikka", &[(paneer.id, dec!(200), Unit::Gm)]).await;

        let result = service
            .update_ingredient(
                paneer.id,
                UpdateIngredientInput {
                    unit: Some(Unit::Kg),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        // same unit plus other fields is still fine
        let renamed = service
            .update_ingredient(
                paneer.id,
                UpdateIngredientInput {
                    name: Some("Malai paneer".to_string()),
                    unit: Some(Unit::Gm),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Malai paneer");
    }

    #[tokio::test]
    async fn test_referenced_ingredient_is_deactivated_not_deleted() {
        let service = test_service();
        let ghee = seed_ingredient(&service, "Ghee", IngredientCategory::Dairy, dec!(600), Unit::Kg).await;
        let salt = seed_ingredient(&service, "Salt", IngredientCategory::Spices, dec!(20), Unit::Kg).await;
        seed_recipe(&service, "Dal tadka", &[(ghee.id, dec!(15), Unit::Gm)]).await;

        let result = service.delete_ingredient(ghee.id).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let ghee = service.deactivate_ingredient(ghee.id).await.unwrap();
        assert!(!ghee.is_active);

        let active = service
            .list_ingredients(GetIngredientsFilter::default())
            .await
            .unwrap();
        assert_eq!(active.iter().map(|i| i.id).collect::<Vec<_>>(), vec![salt.id]);

        let all = service
            .list_ingredients(GetIngredientsFilter {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        service.delete_ingredient(salt.id).await.unwrap();
        assert_eq!(service.get_ingredient(salt.id).await, Err(CoreError::NotFound));
    }

    #[tokio::test]
    async fn test_unit_change_re_expresses_prices() {
        let service = test_service();
        let settings = default_settings();
        let paneer = seed_ingredient(&service, "Paneer", IngredientCategory::Dairy, dec!(300), Unit::Kg).await;
        let recorded_at = Utc::now() - chrono::Duration::hours(1);

        service
            .record_price(
                &settings,
                RecordPriceInput::new(paneer.id, dec!(320), PriceSource::Agmarknet, recorded_at),
            )
            .await
            .unwrap();

        let paneer = service
            .update_ingredient(
                paneer.id,
                UpdateIngredientInput {
                    unit: Some(Unit::Gm),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(paneer.unit, Unit::Gm);
        assert_eq!(paneer.market_price, dec!(0.32));
        assert_eq!(paneer.previous_price, Some(dec!(0.3)));

        let recipe = seed_recipe(&service, "Paneer tikka", &[(paneer.id, dec!(200), Unit::Gm)]).await;
        assert_eq!(recipe.total_ingredient_cost, dec!(64));

        // the same real price, now quoted per gram, is no change against the kg record
        let outcome = service
            .record_price(
                &settings,
                RecordPriceInput::new(paneer.id, dec!(0.32), PriceSource::Agmarknet, Utc::now()),
            )
            .await
            .unwrap();
        assert_eq!(outcome.history.change_percentage, Some(dec!(0)));
        assert_eq!(outcome.history.unit, Unit::Gm);
        assert!(!outcome.applied);
        assert_eq!(outcome.alert, None);
        assert!(notifier(&service).alerts().is_empty());
    }

    #[tokio::test]
    async fn test_unit_change_across_families_is_rejected() {
        let service = test_service();
        let eggs = seed_ingredient(&service, "Eggs", IngredientCategory::Others, dec!(7), Unit::Pc).await;

        let result = service
            .update_ingredient(
                eggs.id,
                UpdateIngredientInput {
                    unit: Some(Unit::Kg),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(
            result,
            Err(CoreError::IncompatibleUnit {
                from: Unit::Pc,
                to: Unit::Kg
            })
        );

        let eggs = service.get_ingredient(eggs.id).await.unwrap();
        assert_eq!((eggs.unit, eggs.market_price), (Unit::Pc, dec!(7)));
    }
}
