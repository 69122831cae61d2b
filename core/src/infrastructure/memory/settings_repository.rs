use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    price_update::{entities::PriceUpdateSettings, ports::PriceSettingsRepository},
};

#[derive(Debug, Default)]
pub struct InMemoryPriceSettingsRepository {
    profiles: RwLock<HashMap<Uuid, PriceUpdateSettings>>,
}

impl InMemoryPriceSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceSettingsRepository for InMemoryPriceSettingsRepository {
    async fn create(&self, settings: PriceUpdateSettings) -> Result<PriceUpdateSettings, CoreError> {
        self.profiles
            .write()
            .await
            .insert(settings.id, settings.clone());

        Ok(settings)
    }

    async fn get_by_id(&self, settings_id: Uuid) -> Result<Option<PriceUpdateSettings>, CoreError> {
        Ok(self.profiles.read().await.get(&settings_id).cloned())
    }

    async fn update(&self, settings: PriceUpdateSettings) -> Result<PriceUpdateSettings, CoreError> {
        let mut profiles = self.profiles.write().await;

        let slot = profiles.get_mut(&settings.id).ok_or(CoreError::NotFound)?;
        *slot = settings.clone();

        Ok(settings)
    }
}
