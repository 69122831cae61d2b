use crate::{
    domain::common::{MenucostConfig, services::Service},
    infrastructure::{
        memory::{
            InMemoryIngredientRepository, InMemoryPriceCalculationRepository,
            InMemoryPriceHistoryRepository, InMemoryPriceSettingsRepository,
            InMemoryRecipeRepository,
        },
        notifier::TracingAlertNotifier,
        price_source::HttpPriceSource,
    },
};

pub type MenucostService = Service<
    InMemoryIngredientRepository,
    InMemoryPriceHistoryRepository,
    InMemoryRecipeRepository,
    InMemoryPriceCalculationRepository,
    InMemoryPriceSettingsRepository,
    HttpPriceSource,
    TracingAlertNotifier,
>;

/// Wires the engine with in-process stores, the HTTP price feed and tracing alerts.
pub async fn create_service(config: MenucostConfig) -> Result<MenucostService, anyhow::Error> {
    let price_source = HttpPriceSource::new(&config.price_source)?;

    tracing::info!(
        endpoint = %config.price_source.endpoint,
        max_concurrent_checks = config.pricing.max_concurrent_checks,
        utc_offset_minutes = config.pricing.business_utc_offset_minutes,
        "Menucost service configured"
    );

    Ok(Service::new(
        InMemoryIngredientRepository::new(),
        InMemoryPriceHistoryRepository::new(),
        InMemoryRecipeRepository::new(),
        InMemoryPriceCalculationRepository::new(),
        InMemoryPriceSettingsRepository::new(),
        price_source,
        TracingAlertNotifier,
        config.pricing,
    ))
}
