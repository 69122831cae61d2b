use std::sync::Arc;

use crate::domain::common::{PricingConfig, locks::KeyedLocks};

/// Engine service. Every domain service trait is implemented on this struct,
/// generic over the ports it talks to.
pub struct Service<I, PH, RE, PC, ST, PS, N> {
    pub(crate) ingredient_repository: Arc<I>,
    pub(crate) price_history_repository: Arc<PH>,
    pub(crate) recipe_repository: Arc<RE>,
    pub(crate) calculation_repository: Arc<PC>,
    pub(crate) settings_repository: Arc<ST>,
    pub(crate) price_source: Arc<PS>,
    pub(crate) alert_notifier: Arc<N>,
    pub(crate) pricing: PricingConfig,
    pub(crate) ingredient_locks: KeyedLocks,
    pub(crate) recipe_locks: KeyedLocks,
    pub(crate) settings_locks: KeyedLocks,
}

impl<I, PH, RE, PC, ST, PS, N> Service<I, PH, RE, PC, ST, PS, N> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ingredient_repository: I,
        price_history_repository: PH,
        recipe_repository: RE,
        calculation_repository: PC,
        settings_repository: ST,
        price_source: PS,
        alert_notifier: N,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            ingredient_repository: Arc::new(ingredient_repository),
            price_history_repository: Arc::new(price_history_repository),
            recipe_repository: Arc::new(recipe_repository),
            calculation_repository: Arc::new(calculation_repository),
            settings_repository: Arc::new(settings_repository),
            price_source: Arc::new(price_source),
            alert_notifier: Arc::new(alert_notifier),
            pricing,
            ingredient_locks: KeyedLocks::new(),
            recipe_locks: KeyedLocks::new(),
            settings_locks: KeyedLocks::new(),
        }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }
}

impl<I, PH, RE, PC, ST, PS, N> Clone for Service<I, PH, RE, PC, ST, PS, N> {
    fn clone(&self) -> Self {
        Self {
            ingredient_repository: self.ingredient_repository.clone(),
            price_history_repository: self.price_history_repository.clone(),
            recipe_repository: self.recipe_repository.clone(),
            calculation_repository: self.calculation_repository.clone(),
            settings_repository: self.settings_repository.clone(),
            price_source: self.price_source.clone(),
            alert_notifier: self.alert_notifier.clone(),
            pricing: self.pricing.clone(),
            ingredient_locks: self.ingredient_locks.clone(),
            recipe_locks: self.recipe_locks.clone(),
            settings_locks: self.settings_locks.clone(),
        }
    }
}
