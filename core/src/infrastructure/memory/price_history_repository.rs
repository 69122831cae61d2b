use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    price_ledger::{
        entities::PriceHistory, ports::PriceHistoryRepository, value_objects::HistoryRange,
    },
};

/// Per-ingredient logs kept in sequence order.
#[derive(Debug, Default)]
pub struct InMemoryPriceHistoryRepository {
    logs: RwLock<HashMap<Uuid, Vec<PriceHistory>>>,
}

impl InMemoryPriceHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceHistoryRepository for InMemoryPriceHistoryRepository {
    async fn append(&self, record: PriceHistory) -> Result<PriceHistory, CoreError> {
        let mut logs = self.logs.write().await;
        let log = logs.entry(record.ingredient_id).or_default();

        let expected = log.last().map_or(0, |last| last.sequence + 1);
        if record.sequence != expected {
            error!(
                ingredient_id = %record.ingredient_id,
                sequence = record.sequence,
                expected,
                "Out of order price history append"
            );
            return Err(CoreError::InternalServerError);
        }

        log.push(record.clone());
        Ok(record)
    }

    async fn latest(&self, ingredient_id: Uuid) -> Result<Option<PriceHistory>, CoreError> {
        Ok(self
            .logs
            .read()
            .await
            .get(&ingredient_id)
            .and_then(|log| log.last().cloned()))
    }

    async fn fetch_page(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
        after_sequence: Option<u64>,
        limit: usize,
    ) -> Result<Vec<PriceHistory>, CoreError> {
        let logs = self.logs.read().await;
        let Some(log) = logs.get(&ingredient_id) else {
            return Ok(Vec::new());
        };

        // sequence is the index into the log
        let start = after_sequence.map_or(0, |after| (after + 1) as usize);

        Ok(log
            .iter()
            .skip(start)
            .filter(|record| range.contains(record.recorded_at))
            .take(limit)
            .cloned()
            .collect())
    }
}
