use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{
        common::{PricingConfig, entities::app_errors::CoreError, services::Service},
        ingredient::{
            entities::{Ingredient, IngredientCategory, PriceSource},
            ports::IngredientService,
            value_objects::CreateIngredientInput,
        },
        price_ledger::{entities::PriceAlert, ports::AlertNotifier},
        price_update::{
            entities::{ObservedPrice, PriceUpdateSettings, PriceUpdateSettingsConfig},
            ports::PriceSourceClient,
        },
        recipe::{
            entities::{MenuItemRecipe, OverheadCosts},
            ports::RecipeService,
            value_objects::{CreateRecipeInput, RecipeIngredientInput},
        },
        unit::value_objects::Unit,
    },
    infrastructure::memory::{
        InMemoryIngredientRepository, InMemoryPriceCalculationRepository,
        InMemoryPriceHistoryRepository, InMemoryPriceSettingsRepository,
        InMemoryRecipeRepository,
    },
};

#[derive(Debug, Clone)]
pub enum Quote {
    Price(Decimal, Unit, DateTime<Utc>),
    Undated(Decimal, Unit),
    Fail(CoreError),
    Hang,
}

/// Price source answering from a per-ingredient script.
#[derive(Debug, Default)]
pub struct ScriptedPriceSource {
    quotes: Mutex<HashMap<Uuid, Quote>>,
    calls: Mutex<Vec<Uuid>>,
}

impl ScriptedPriceSource {
    pub fn set(&self, ingredient_id: Uuid, quote: Quote) {
        self.quotes.lock().unwrap().insert(ingredient_id, quote);
    }

    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

impl PriceSourceClient for ScriptedPriceSource {
    async fn fetch_latest_price(&self, ingredient: Ingredient) -> Result<ObservedPrice, CoreError> {
        self.calls.lock().unwrap().push(ingredient.id);
        let quote = self.quotes.lock().unwrap().get(&ingredient.id).cloned();

        match quote {
            Some(Quote::Price(price, unit, observed_at)) => Ok(observed(price, unit, Some(observed_at))),
            Some(Quote::Undated(price, unit)) => Ok(observed(price, unit, None)),
            Some(Quote::Fail(e)) => Err(e),
            Some(Quote::Hang) => std::future::pending().await,
            None => Err(CoreError::SourceFetch("no quote scripted".to_string())),
        }
    }
}

fn observed(price: Decimal, unit: Unit, observed_at: Option<DateTime<Utc>>) -> ObservedPrice {
    ObservedPrice {
        price,
        unit,
        source: PriceSource::Api,
        observed_at,
        market_name: Some("Test mandi".to_string()),
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<PriceAlert>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<PriceAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertNotifier for RecordingNotifier {
    async fn notify(&self, alert: PriceAlert) -> Result<(), CoreError> {
        self.alerts.lock().unwrap().push(alert);
        Ok(())
    }
}

pub type TestService = Service<
    InMemoryIngredientRepository,
    InMemoryPriceHistoryRepository,
    InMemoryRecipeRepository,
    InMemoryPriceCalculationRepository,
    InMemoryPriceSettingsRepository,
    ScriptedPriceSource,
    RecordingNotifier,
>;

pub fn test_service() -> TestService {
    Service::new(
        InMemoryIngredientRepository::new(),
        InMemoryPriceHistoryRepository::new(),
        InMemoryRecipeRepository::new(),
        InMemoryPriceCalculationRepository::new(),
        InMemoryPriceSettingsRepository::new(),
        ScriptedPriceSource::default(),
        RecordingNotifier::default(),
        PricingConfig {
            history_page_size: 2,
            ..Default::default()
        },
    )
}

pub fn price_source(service: &TestService) -> Arc<ScriptedPriceSource> {
    service.price_source.clone()
}

pub fn notifier(service: &TestService) -> Arc<RecordingNotifier> {
    service.alert_notifier.clone()
}

/// 5 % record threshold, 10 % alert threshold, every category, checked every 24 h.
pub fn default_settings() -> PriceUpdateSettings {
    PriceUpdateSettings::new(PriceUpdateSettingsConfig::default()).unwrap()
}

pub async fn seed_ingredient(
    service: &TestService,
    name: &str,
    category: IngredientCategory,
    market_price: Decimal,
    unit: Unit,
) -> Ingredient {
    service
        .create_ingredient(CreateIngredientInput {
            name: name.to_string(),
            category,
            market_price,
            unit,
            price_source: PriceSource::Api,
            auto_update_enabled: true,
        })
        .await
        .unwrap()
}

/// A recipe with no overhead and a 25 % margin.
pub async fn seed_recipe(
    service: &TestService,
    name: &str,
    lines: &[(Uuid, Decimal, Unit)],
) -> MenuItemRecipe {
    service
        .create_recipe(CreateRecipeInput {
            name: name.to_string(),
            menu_item_id: None,
            ingredients: lines
                .iter()
                .map(|&(ingredient_id, quantity, unit)| RecipeIngredientInput {
                    ingredient_id,
                    quantity,
                    unit,
                })
                .collect(),
            overhead_costs: OverheadCosts::default(),
            profit_margin: Decimal::from(25),
        })
        .await
        .unwrap()
}
