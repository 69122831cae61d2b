use futures::TryStreamExt;
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    common::{
        entities::app_errors::CoreError, percentage_change, round_money, round_percentage,
        services::Service,
    },
    ingredient::ports::IngredientRepository,
    price_ledger::{
        cursor::PriceHistoryCursor,
        entities::{PriceAlert, PriceHistory, PriceHistoryConfig},
        ports::{AlertNotifier, PriceHistoryRepository, PriceLedgerService},
        value_objects::{HistoryRange, PriceSummary, RecordPriceInput, RecordPriceOutcome},
    },
    price_update::{
        entities::PriceUpdateSettings,
        ports::{PriceSettingsRepository, PriceSourceClient},
    },
    recipe::ports::{PriceCalculationRepository, RecipeRepository},
    unit::convert_unit_price,
};

impl<I, PH, RE, PC, ST, PS, N> PriceLedgerService for Service<I, PH, RE, PC, ST, PS, N>
where
    I: IngredientRepository,
    PH: PriceHistoryRepository + 'static,
    RE: RecipeRepository,
    PC: PriceCalculationRepository,
    ST: PriceSettingsRepository,
    PS: PriceSourceClient,
    N: AlertNotifier,
{
    type History = PH;

    #[instrument(skip(self, settings, input), fields(ingredient_id = %input.ingredient_id, price = %input.price))]
    async fn record_price(
        &self,
        settings: &PriceUpdateSettings,
        input: RecordPriceInput,
    ) -> Result<RecordPriceOutcome, CoreError> {
        if input.price <= Decimal::ZERO {
            return Err(CoreError::validation("price must be positive"));
        }

        let (outcome, previous_price) = {
            let _guard = self.ingredient_locks.lock(input.ingredient_id).await;

            let mut ingredient = self
                .ingredient_repository
                .get_by_id(input.ingredient_id)
                .await?
                .ok_or(CoreError::NotFound)?;

            let latest = self
                .price_history_repository
                .latest(input.ingredient_id)
                .await?;

            if let Some(latest) = &latest {
                if input.recorded_at < latest.recorded_at {
                    return Err(CoreError::validation(format!(
                        "observation at {} is older than the latest record at {}",
                        input.recorded_at, latest.recorded_at
                    )));
                }
            }

            // the ingredient's unit may have changed since the latest record
            let previous_price = latest
                .as_ref()
                .map(|record| convert_unit_price(record.price, record.unit, ingredient.unit))
                .transpose()?;
            let change = previous_price.and_then(|last| percentage_change(last, input.price));
            let stored_change = change.map(round_percentage);

            let history = self
                .price_history_repository
                .append(PriceHistory::new(PriceHistoryConfig {
                    ingredient_id: ingredient.id,
                    ingredient_name: ingredient.name.clone(),
                    sequence: latest.as_ref().map_or(0, |record| record.sequence + 1),
                    price: input.price,
                    unit: ingredient.unit,
                    source: input.source,
                    market_name: input.market_name,
                    recorded_at: input.recorded_at,
                    change_percentage: stored_change,
                    notes: input.notes,
                }))
                .await?;

            let applied = change
                .is_none_or(|change| change.abs() >= settings.min_change_percentage_to_record);

            if applied {
                ingredient.apply_price(input.price, stored_change, input.source, input.recorded_at);
                ingredient = self.ingredient_repository.update(ingredient).await?;

                tracing::info!(
                    ingredient_id = %ingredient.id,
                    market_price = %ingredient.market_price,
                    change_percentage = ?stored_change,
                    "Live price updated"
                );
            } else {
                tracing::debug!(
                    ingredient_id = %ingredient.id,
                    change_percentage = ?stored_change,
                    threshold = %settings.min_change_percentage_to_record,
                    "Observation below record threshold, logged to history only"
                );
            }

            let alert = match (previous_price, change) {
                (Some(old_price), Some(change))
                    if change.abs() >= settings.alert_threshold_percentage =>
                {
                    Some(PriceAlert {
                        ingredient_id: ingredient.id,
                        ingredient_name: ingredient.name.clone(),
                        old_price,
                        new_price: input.price,
                        change_percentage: round_percentage(change),
                        recorded_at: input.recorded_at,
                    })
                }
                _ => None,
            };

            (
                RecordPriceOutcome {
                    history,
                    ingredient,
                    applied,
                    alert,
                },
                previous_price,
            )
        };

        if let Some(alert) = &outcome.alert {
            tracing::info!(
                ingredient_id = %alert.ingredient_id,
                old_price = ?previous_price,
                new_price = %alert.new_price,
                change_percentage = %alert.change_percentage,
                "Price alert raised"
            );

            if let Err(e) = self.alert_notifier.notify(alert.clone()).await {
                tracing::warn!(
                    ingredient_id = %alert.ingredient_id,
                    error = %e,
                    "Failed to deliver price alert"
                );
            }
        }

        Ok(outcome)
    }

    #[instrument(skip(self, settings, inputs), fields(count = inputs.len()))]
    async fn record_prices(
        &self,
        settings: &PriceUpdateSettings,
        inputs: Vec<RecordPriceInput>,
    ) -> Vec<Result<RecordPriceOutcome, CoreError>> {
        let mut results = Vec::with_capacity(inputs.len());

        for input in inputs {
            let ingredient_id = input.ingredient_id;
            let result = self.record_price(settings, input).await;
            if let Err(e) = &result {
                tracing::warn!(ingredient_id = %ingredient_id, error = %e, "Price observation rejected");
            }
            results.push(result);
        }

        results
    }

    async fn get_history(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
    ) -> Result<PriceHistoryCursor<PH>, CoreError> {
        range.validate()?;

        self.ingredient_repository
            .get_by_id(ingredient_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        Ok(PriceHistoryCursor::new(
            self.price_history_repository.clone(),
            ingredient_id,
            range,
            self.pricing.history_page_size,
        ))
    }

    async fn price_summary(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
    ) -> Result<PriceSummary, CoreError> {
        let cursor = self.get_history(ingredient_id, range).await?;

        let empty = PriceSummary {
            ingredient_id,
            count: 0,
            min_price: None,
            max_price: None,
            average_price: None,
            first_price: None,
            latest_price: None,
            net_change_percentage: None,
        };

        let (mut summary, total) = cursor
            .stream()
            .try_fold((empty, Decimal::ZERO), |(mut summary, total), record| async move {
                summary.count += 1;
                summary.min_price = Some(summary.min_price.map_or(record.price, |p| p.min(record.price)));
                summary.max_price = Some(summary.max_price.map_or(record.price, |p| p.max(record.price)));
                summary.first_price.get_or_insert(record.price);
                summary.latest_price = Some(record.price);
                Ok((summary, total + record.price))
            })
            .await?;

        if summary.count > 0 {
            summary.average_price = Some(round_money(total / Decimal::from(summary.count)));
        }
        if let (Some(first), Some(latest)) = (summary.first_price, summary.latest_price) {
            summary.net_change_percentage = percentage_change(first, latest).map(round_percentage);
        }

        Ok(summary)
    }
}
