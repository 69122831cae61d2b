use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    recipe::{entities::PriceCalculation, ports::PriceCalculationRepository},
};

#[derive(Debug, Default)]
pub struct InMemoryPriceCalculationRepository {
    receipts: RwLock<HashMap<Uuid, Vec<PriceCalculation>>>,
}

impl InMemoryPriceCalculationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceCalculationRepository for InMemoryPriceCalculationRepository {
    async fn create(&self, calculation: PriceCalculation) -> Result<PriceCalculation, CoreError> {
        self.receipts
            .write()
            .await
            .entry(calculation.recipe_id)
            .or_default()
            .push(calculation.clone());

        Ok(calculation)
    }

    async fn list_by_recipe(&self, recipe_id: Uuid) -> Result<Vec<PriceCalculation>, CoreError> {
        let receipts = self.receipts.read().await;

        Ok(receipts
            .get(&recipe_id)
            .map(|receipts| receipts.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
