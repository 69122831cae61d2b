use std::future::Future;
use uuid::Uuid;

use crate::domain::{
    common::entities::app_errors::CoreError,
    price_ledger::{
        cursor::PriceHistoryCursor,
        entities::{PriceAlert, PriceHistory},
        value_objects::{HistoryRange, PriceSummary, RecordPriceInput, RecordPriceOutcome},
    },
    price_update::entities::PriceUpdateSettings,
};

/// Append-only store of observed prices
#[cfg_attr(test, mockall::automock)]
pub trait PriceHistoryRepository: Send + Sync {
    /// Append a record; its sequence must follow the latest one
    fn append(
        &self,
        record: PriceHistory,
    ) -> impl Future<Output = Result<PriceHistory, CoreError>> + Send;

    /// Latest record of an ingredient, if any
    fn latest(
        &self,
        ingredient_id: Uuid,
    ) -> impl Future<Output = Result<Option<PriceHistory>, CoreError>> + Send;

    /// Records inside `range` with `sequence > after_sequence`, ascending, at most `limit`.
    fn fetch_page(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
        after_sequence: Option<u64>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PriceHistory>, CoreError>> + Send;
}

/// Receives price alerts; delivery is owned by the notification collaborator
#[cfg_attr(test, mockall::automock)]
pub trait AlertNotifier: Send + Sync {
    /// Deliver one price alert
    fn notify(&self, alert: PriceAlert) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Service trait for the ingredient price ledger
pub trait PriceLedgerService: Send + Sync {
    type History: PriceHistoryRepository + 'static;

    /// Append an observation, applying it to the live price when it moves enough
    fn record_price(
        &self,
        settings: &PriceUpdateSettings,
        input: RecordPriceInput,
    ) -> impl Future<Output = Result<RecordPriceOutcome, CoreError>> + Send;

    /// Records each observation independently, results in input order.
    fn record_prices(
        &self,
        settings: &PriceUpdateSettings,
        inputs: Vec<RecordPriceInput>,
    ) -> impl Future<Output = Vec<Result<RecordPriceOutcome, CoreError>>> + Send;

    /// Lazy, restartable cursor over the history within `range`
    fn get_history(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
    ) -> impl Future<Output = Result<PriceHistoryCursor<Self::History>, CoreError>> + Send;

    /// Aggregate statistics over the history within `range`
    fn price_summary(
        &self,
        ingredient_id: Uuid,
        range: HistoryRange,
    ) -> impl Future<Output = Result<PriceSummary, CoreError>> + Send;
}
