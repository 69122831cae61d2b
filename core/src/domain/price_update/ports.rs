use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    ingredient::entities::Ingredient,
    price_update::{
        entities::{
            CheckOutcome, CycleReport, ObservedPrice, PriceUpdateSettings,
            PriceUpdateSettingsConfig,
        },
        value_objects::UpdatePriceSettingsInput,
    },
};

/// Repository trait for price update settings profiles
#[cfg_attr(test, mockall::automock)]
pub trait PriceSettingsRepository: Send + Sync {
    /// Persist a new settings profile
    fn create(
        &self,
        settings: PriceUpdateSettings,
    ) -> impl Future<Output = Result<PriceUpdateSettings, CoreError>> + Send;

    /// Get a settings profile by ID
    fn get_by_id(
        &self,
        settings_id: Uuid,
    ) -> impl Future<Output = Result<Option<PriceUpdateSettings>, CoreError>> + Send;

    /// Overwrite a stored settings profile
    fn update(
        &self,
        settings: PriceUpdateSettings,
    ) -> impl Future<Output = Result<PriceUpdateSettings, CoreError>> + Send;
}

/// External market price source
#[cfg_attr(test, mockall::automock)]
pub trait PriceSourceClient: Send + Sync {
    /// Fetch the latest market quote for an ingredient
    fn fetch_latest_price(
        &self,
        ingredient: Ingredient,
    ) -> impl Future<Output = Result<ObservedPrice, CoreError>> + Send;
}

/// Service trait for scheduled price updates, driven by an external scheduler
pub trait PriceUpdateService: Send + Sync {
    /// Validate and persist a new settings profile
    fn create_settings(
        &self,
        config: PriceUpdateSettingsConfig,
    ) -> impl Future<Output = Result<PriceUpdateSettings, CoreError>> + Send;

    /// Get a settings profile by ID
    fn get_settings(
        &self,
        settings_id: Uuid,
    ) -> impl Future<Output = Result<PriceUpdateSettings, CoreError>> + Send;

    /// Change thresholds, frequency or categories of a profile
    fn update_settings(
        &self,
        settings_id: Uuid,
        input: UpdatePriceSettingsInput,
    ) -> impl Future<Output = Result<PriceUpdateSettings, CoreError>> + Send;

    /// Source failures never surface as errors; they end the check as `Skipped`.
    fn check_ingredient(
        &self,
        settings: &PriceUpdateSettings,
        ingredient_id: Uuid,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<CheckOutcome, CoreError>> + Send;

    /// Check every due ingredient once and stamp the profile's last run
    fn run_cycle(
        &self,
        settings_id: Uuid,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<CycleReport, CoreError>> + Send;
}
