use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service},
    ingredient::{ports::IngredientRepository, value_objects::GetIngredientsFilter},
    price_ledger::{
        ports::{AlertNotifier, PriceHistoryRepository, PriceLedgerService},
        value_objects::RecordPriceInput,
    },
    price_update::{
        entities::{
            CheckOutcome, CheckState, CycleReport, PriceUpdateSettings, PriceUpdateSettingsConfig,
            SkipReason,
        },
        policies::evaluate,
        ports::{PriceSettingsRepository, PriceSourceClient, PriceUpdateService},
        value_objects::UpdatePriceSettingsInput,
    },
    recipe::ports::{PriceCalculationRepository, RecipeRepository},
    unit::convert_unit_price,
};

impl<I, PH, RE, PC, ST, PS, N> Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
{
    /// A fetched quote settles the check until the next due time, applied or not.
    async fn mark_fetched(&self, ingredient_id: Uuid, now: DateTime<Utc>) -> Result<(), CoreError> {
        let _guard = self.ingredient_locks.lock(ingredient_id).await;

        let mut ingredient = self
            .ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        ingredient.mark_fetched(now);
        self.ingredient_repository.update(ingredient).await?;

        Ok(())
    }
}

impl<I, PH, RE, PC, ST, PS, N> PriceUpdateService for Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
    PH: PriceHistoryRepository + 'static,
    RE: RecipeRepository,
    PC: PriceCalculationRepository,
    ST: PriceSettingsRepository,
    PS: PriceSourceClient,
    N: AlertNotifier,
{
    #[instrument(skip(self, config), fields(name = %config.name))]
    async fn create_settings(
        &self,
        config: PriceUpdateSettingsConfig,
    ) -> Result<PriceUpdateSettings, CoreError> {
        let settings = PriceUpdateSettings::new(config)?;
        self.settings_repository.create(settings).await
    }

    async fn get_settings(&self, settings_id: Uuid) -> Result<PriceUpdateSettings, CoreError> {
        self.settings_repository
            .get_by_id(settings_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    #[instrument(skip(self, input))]
    async fn update_settings(
        &self,
        settings_id: Uuid,
        input: UpdatePriceSettingsInput,
    ) -> Result<PriceUpdateSettings, CoreError> {
        let _guard = self.settings_locks.lock(settings_id).await;
        let mut settings = self.get_settings(settings_id).await?;

        if let Some(name) = input.name {
            settings.name = name.trim().to_string();
        }
        if let Some(hours) = input.update_frequency_hours {
            settings.update_frequency_hours = hours;
        }
        if let Some(min_change) = input.min_change_percentage_to_record {
            settings.min_change_percentage_to_record = min_change;
        }
        if let Some(alert_threshold) = input.alert_threshold_percentage {
            settings.alert_threshold_percentage = alert_threshold;
        }
        if let Some(categories) = input.enabled_categories {
            settings.enabled_categories = categories;
        }
        settings.validate()?;
        settings.updated_at = Utc::now();

        let settings = self.settings_repository.update(settings).await?;

        tracing::info!(
            settings_id = %settings.id,
            frequency_hours = settings.update_frequency_hours,
            min_change = %settings.min_change_percentage_to_record,
            alert_threshold = %settings.alert_threshold_percentage,
            "Price update settings changed"
        );

        Ok(settings)
    }

    #[instrument(skip(self, settings))]
    async fn check_ingredient(
        &self,
        settings: &PriceUpdateSettings,
        ingredient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CheckOutcome, CoreError> {
        let ingredient = self
            .ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        if evaluate(&ingredient, settings, now) == CheckState::Idle {
            return Ok(CheckOutcome::idle(ingredient_id));
        }

        let expected_unit = ingredient.unit;
        let fetched = tokio::time::timeout(
            self.pricing.price_source_timeout,
            self.price_source.fetch_latest_price(ingredient),
        )
        .await
        .unwrap_or(Err(CoreError::SourceTimeout));

        let observed = match fetched {
            Ok(observed) => observed,
            Err(e) => {
                tracing::warn!(
                    ingredient_id = %ingredient_id,
                    error = %e,
                    "Price source fetch failed, retrying next cycle"
                );
                return Ok(CheckOutcome::skipped(
                    ingredient_id,
                    SkipReason::SourceUnavailable(e.to_string()),
                    None,
                ));
            }
        };

        let price = match convert_unit_price(observed.price, observed.unit, expected_unit) {
            Ok(price) => price,
            Err(_) => {
                tracing::warn!(
                    ingredient_id = %ingredient_id,
                    quoted = %observed.unit,
                    expected = %expected_unit,
                    "Price source quoted an incompatible unit"
                );
                return Ok(CheckOutcome::skipped(
                    ingredient_id,
                    SkipReason::IncompatibleQuote {
                        quoted: observed.unit,
                        expected: expected_unit,
                    },
                    None,
                ));
            }
        };

        let input = RecordPriceInput {
            ingredient_id,
            price,
            source: observed.source,
            recorded_at: observed.observed_at.unwrap_or(now),
            market_name: observed.market_name,
            notes: None,
        };

        let record = match self.record_price(settings, input).await {
            Ok(record) => record,
            Err(CoreError::Validation(message)) => {
                tracing::warn!(
                    ingredient_id = %ingredient_id,
                    reason = %message,
                    "Observed price rejected by the ledger"
                );
                return Ok(CheckOutcome::skipped(
                    ingredient_id,
                    SkipReason::Rejected(message),
                    None,
                ));
            }
            Err(e) => return Err(e),
        };

        self.mark_fetched(ingredient_id, now).await?;

        if !record.applied {
            return Ok(CheckOutcome::skipped(
                ingredient_id,
                SkipReason::BelowThreshold,
                Some(record),
            ));
        }

        let stale_recipes: Vec<Uuid> = self
            .recipe_repository
            .find_by_ingredient(ingredient_id)
            .await?
            .into_iter()
            .map(|recipe| recipe.id)
            .collect();

        if !stale_recipes.is_empty() {
            // serialized with recalculation so a recompute in flight cannot clear the mark
            for recipe_id in &stale_recipes {
                let _guard = self.recipe_locks.lock(*recipe_id).await;
                self.recipe_repository.mark_stale(vec![*recipe_id]).await?;
            }

            tracing::debug!(
                ingredient_id = %ingredient_id,
                count = stale_recipes.len(),
                "Recipes marked stale"
            );
        }

        Ok(CheckOutcome {
            ingredient_id,
            state: CheckState::Updated,
            skip_reason: None,
            record: Some(record),
            stale_recipes,
        })
    }

    #[instrument(skip(self))]
    async fn run_cycle(
        &self,
        settings_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CycleReport, CoreError> {
        let settings = self.get_settings(settings_id).await?;

        let ingredients = self
            .ingredient_repository
            .list(GetIngredientsFilter::default())
            .await?;

        let mut idle = ingredients.len();
        let due: Vec<Uuid> = ingredients
            .iter()
            .filter(|ingredient| evaluate(ingredient, &settings, now) == CheckState::DueForCheck)
            .map(|ingredient| ingredient.id)
            .collect();
        idle -= due.len();

        let results: Vec<Result<CheckOutcome, CoreError>> = stream::iter(due)
            .map(|ingredient_id| self.check_ingredient(&settings, ingredient_id, now))
            .buffer_unordered(self.pricing.max_concurrent_checks.max(1))
            .collect()
            .await;

        let mut report = CycleReport {
            settings_id,
            ran_at: now,
            updated: 0,
            skipped: 0,
            idle: 0,
            alerts: 0,
            recipes_marked_stale: 0,
            outcomes: Vec::with_capacity(results.len()),
        };

        for result in results {
            match result {
                Ok(outcome) => {
                    match outcome.state {
                        CheckState::Updated => report.updated += 1,
                        CheckState::Skipped => report.skipped += 1,
                        CheckState::Idle | CheckState::DueForCheck => idle += 1,
                    }
                    if outcome.raised_alert() {
                        report.alerts += 1;
                    }
                    report.recipes_marked_stale += outcome.stale_recipes.len();
                    report.outcomes.push(outcome);
                }
                Err(e) => {
                    // e.g. the ingredient was deleted mid-cycle
                    tracing::error!(error = %e, "Price check failed");
                    report.skipped += 1;
                }
            }
        }
        report.idle = idle;

        {
            // re-read so settings changed while the checks ran are kept
            let _guard = self.settings_locks.lock(settings_id).await;
            let mut latest = self.get_settings(settings_id).await?;
            latest.last_update_run = Some(now);
            latest.updated_at = Utc::now();
            self.settings_repository.update(latest).await?;
        }

        tracing::info!(
            settings_id = %settings_id,
            updated = report.updated,
            skipped = report.skipped,
            idle = report.idle,
            alerts = report.alerts,
            recipes_marked_stale = report.recipes_marked_stale,
            "Price update cycle finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        domain::{
            ingredient::{
                entities::{IngredientCategory, PriceSource},
                ports::IngredientService,
                value_objects::UpdateIngredientInput,
            },
            price_ledger::value_objects::HistoryRange,
            recipe::ports::RecipeService,
            unit::value_objects::Unit,
        },
        test_support::{
            Quote, default_settings, notifier, price_source, seed_ingredient, seed_recipe,
            test_service,
        },
    };

    #[tokio::test]
    async fn test_not_due_is_idle_without_fetching() {
        let service = test_service();
        let now = Utc::now();
        let onion = seed_ingredient(&service, "Onion", IngredientCategory::Vegetables, dec!(40), Unit::Kg).await;
        service
            .update_ingredient(
                onion.id,
                UpdateIngredientInput {
                    auto_update_enabled: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = service
            .check_ingredient(&default_settings(), onion.id, now)
            .await
            .unwrap();

        assert_eq!(outcome.state, CheckState::Idle);
        assert!(price_source(&service).calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_timeout_skips_without_mutation() {
        let service = test_service();
        let now = Utc::now();
        let milk = seed_ingredient(&service, "Milk", IngredientCategory::Dairy, dec!(60), Unit::Ltr).await;
        price_source(&service).set(milk.id, Quote::Hang);

        let outcome = service
            .check_ingredient(&default_settings(), milk.id, now)
            .await
            .unwrap();

        assert_eq!(outcome.state, CheckState::Skipped);
        assert_eq!(
            outcome.skip_reason,
            Some(SkipReason::SourceUnavailable(CoreError::SourceTimeout.to_string()))
        );

        let milk_after = service.get_ingredient(milk.id).await.unwrap();
        assert_eq!(milk_after, milk);
        let history = service
            .get_history(milk.id, HistoryRange::all())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_is_retried_next_cycle() {
        let service = test_service();
        let now = Utc::now();
        let milk = seed_ingredient(&service, "Milk", IngredientCategory::Dairy, dec!(60), Unit::Ltr).await;
        price_source(&service).set(
            milk.id,
            Quote::Fail(CoreError::SourceFetch("503".to_string())),
        );

        let outcome = service
            .check_ingredient(&default_settings(), milk.id, now)
            .await
            .unwrap();
        assert_eq!(outcome.state, CheckState::Skipped);

        // the failed fetch leaves the ingredient due
        let milk = service.get_ingredient(milk.id).await.unwrap();
        assert_eq!(milk.last_price_fetch, None);
        assert_eq!(evaluate(&milk, &default_settings(), now), CheckState::DueForCheck);
    }

    #[tokio::test]
    async fn test_incompatible_quote_is_skipped() {
        let service = test_service();
        let now = Utc::now();
        let paneer = seed_ingredient(&service, "Paneer", IngredientCategory::Dairy, dec!(320), Unit::Kg).await;
        price_source(&service).set(paneer.id, Quote::Price(dec!(300), Unit::Ltr, now));

        let outcome = service
            .check_ingredient(&default_settings(), paneer.id, now)
            .await
            .unwrap();

        assert_eq!(
            outcome.skip_reason,
            Some(SkipReason::IncompatibleQuote {
                quoted: Unit::Ltr,
                expected: Unit::Kg
            })
        );
        assert_eq!(service.get_ingredient(paneer.id).await.unwrap().market_price, dec!(320));
    }

    #[tokio::test]
    async fn test_quote_in_other_unit_is_converted_and_marks_recipes_stale() {
        let service = test_service();
        let now = Utc::now();
        let paneer = seed_ingredient(&service, "Paneer", IngredientCategory::Dairy, dec!(320), Unit::Kg).await;
        let recipe = seed_recipe(&service, "Paneer tikka", &[(paneer.id, dec!(200), Unit::Gm)]).await;
        price_source(&service).set(paneer.id, Quote::Price(dec!(0.35), Unit::Gm, now));

        let outcome = service
            .check_ingredient(&default_settings(), paneer.id, now)
            .await
            .unwrap();

        assert_eq!(outcome.state, CheckState::Updated);
        assert_eq!(outcome.stale_recipes, vec![recipe.id]);

        let paneer = service.get_ingredient(paneer.id).await.unwrap();
        assert_eq!(paneer.market_price, dec!(350));
        assert!(paneer.last_price_fetch.is_some());

        // marked, not recomputed
        let recipe = service.get_recipe(recipe.id).await.unwrap();
        assert!(recipe.is_stale);
        assert_eq!(recipe.ingredients[0].unit_price, dec!(320));
    }

    #[tokio::test]
    async fn test_below_threshold_is_skipped_and_settled() {
        let service = test_service();
        let settings = default_settings();
        let now = Utc::now();
        let rice = seed_ingredient(&service, "Rice", IngredientCategory::Grains, dec!(100), Unit::Kg).await;
        let recipe = seed_recipe(&service, "Jeera rice", &[(rice.id, dec!(150), Unit::Gm)]).await;

        service
            .record_price(
                &settings,
                RecordPriceInput::new(rice.id, dec!(100), PriceSource::Manual, now - Duration::hours(25)),
            )
            .await
            .unwrap();
        price_source(&service).set(rice.id, Quote::Price(dec!(103), Unit::Kg, now));

        let outcome = service.check_ingredient(&settings, rice.id, now).await.unwrap();

        assert_eq!(outcome.state, CheckState::Skipped);
        assert_eq!(outcome.skip_reason, Some(SkipReason::BelowThreshold));
        assert!(outcome.stale_recipes.is_empty());
        assert!(!service.get_recipe(recipe.id).await.unwrap().is_stale);

        // fetched, so not due again until the next window
        let rice = service.get_ingredient(rice.id).await.unwrap();
        assert_eq!(rice.last_price_fetch, Some(now));
        assert_eq!(evaluate(&rice, &settings, now), CheckState::Idle);
    }

    #[tokio::test]
    async fn test_run_cycle_report() {
        let service = test_service();
        let now = Utc::now();

        let settings = service
            .create_settings(PriceUpdateSettingsConfig {
                enabled_categories: BTreeSet::from([IngredientCategory::Vegetables]),
                ..Default::default()
            })
            .await
            .unwrap();

        let tomato = seed_ingredient(&service, "Tomato", IngredientCategory::Vegetables, dec!(30), Unit::Kg).await;
        let onion = seed_ingredient(&service, "Onion", IngredientCategory::Vegetables, dec!(40), Unit::Kg).await;
        let cardamom = seed_ingredient(&service, "Cardamom", IngredientCategory::Spices, dec!(3000), Unit::Kg).await;
        seed_recipe(&service, "Tomato soup", &[(tomato.id, dec!(250), Unit::Gm)]).await;

        let source = price_source(&service);
        source.set(tomato.id, Quote::Price(dec!(45), Unit::Kg, now));
        source.set(onion.id, Quote::Fail(CoreError::SourceFetch("down".to_string())));

        let report = service.run_cycle(settings.id, now).await.unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.idle, 1);
        assert_eq!(report.recipes_marked_stale, 1);
        assert!(!source.calls().contains(&cardamom.id));

        let settings = service.get_settings(settings.id).await.unwrap();
        assert_eq!(settings.last_update_run, Some(now));

        // the first observation of an ingredient never alerts
        assert_eq!(report.alerts, 0);
        assert!(notifier(&service).alerts().is_empty());
    }

    #[tokio::test]
    async fn test_settings_updates_are_validated() {
        let service = test_service();
        let settings = service
            .create_settings(PriceUpdateSettingsConfig::default())
            .await
            .unwrap();

        let result = service
            .update_settings(
                settings.id,
                UpdatePriceSettingsInput {
                    update_frequency_hours: Some(0),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let updated = service
            .update_settings(
                settings.id,
                UpdatePriceSettingsInput {
                    alert_threshold_percentage: Some(dec!(15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.alert_threshold_percentage, dec!(15));
        assert_eq!(updated.update_frequency_hours, 24);

        assert_eq!(
            service.get_settings(Uuid::new_v4()).await,
            Err(CoreError::NotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_keeps_settings_changed_while_it_runs() {
        let service = test_service();
        let now = Utc::now();
        let settings = service
            .create_settings(PriceUpdateSettingsConfig::default())
            .await
            .unwrap();
        let milk = seed_ingredient(&service, "Milk", IngredientCategory::Dairy, dec!(60), Unit::Ltr).await;
        price_source(&service).set(milk.id, Quote::Hang);

        let (report, updated) = tokio::join!(
            service.run_cycle(settings.id, now),
            service.update_settings(
                settings.id,
                UpdatePriceSettingsInput {
                    alert_threshold_percentage: Some(dec!(50)),
                    ..Default::default()
                },
            ),
        );
        assert_eq!(report.unwrap().skipped, 1);
        assert_eq!(updated.unwrap().alert_threshold_percentage, dec!(50));

        let after = service.get_settings(settings.id).await.unwrap();
        assert_eq!(after.alert_threshold_percentage, dec!(50));
        assert_eq!(after.last_update_run, Some(now));
    }

    #[tokio::test]
    async fn test_undated_quote_is_recorded_at_the_check_time() {
        let service = test_service();
        let now = Utc::now() - Duration::days(3);
        let rice = seed_ingredient(&service, "Basmati rice", IngredientCategory::Grains, dec!(90), Unit::Kg).await;
        price_source(&service).set(rice.id, Quote::Undated(dec!(95), Unit::Kg));

        let outcome = service
            .check_ingredient(&default_settings(), rice.id, now)
            .await
            .unwrap();

        let record = outcome.record.unwrap();
        assert_eq!(record.history.recorded_at, now);
        assert_eq!(record.ingredient.last_price_fetch, Some(now));
    }
}
