use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    common::{entities::app_errors::CoreError, generate_timestamp},
    ingredient::entities::{IngredientCategory, PriceSource},
    price_ledger::value_objects::RecordPriceOutcome,
    unit::value_objects::Unit,
};

pub const DEFAULT_UPDATE_FREQUENCY_HOURS: u32 = 24;
pub const DEFAULT_MIN_CHANGE_PERCENTAGE: Decimal = dec!(5);
pub const DEFAULT_ALERT_THRESHOLD_PERCENTAGE: Decimal = dec!(10);

/// Scheduling and threshold profile for automatic price updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdateSettings {
    pub id: Uuid,
    pub name: String,
    pub update_frequency_hours: u32,
    pub min_change_percentage_to_record: Decimal,
    pub alert_threshold_percentage: Decimal,
    pub enabled_categories: BTreeSet<IngredientCategory>,
    pub last_update_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PriceUpdateSettingsConfig {
    pub name: String,
    pub update_frequency_hours: u32,
    pub min_change_percentage_to_record: Decimal,
    pub alert_threshold_percentage: Decimal,
    pub enabled_categories: BTreeSet<IngredientCategory>,
}

impl Default for PriceUpdateSettingsConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            update_frequency_hours: DEFAULT_UPDATE_FREQUENCY_HOURS,
            min_change_percentage_to_record: DEFAULT_MIN_CHANGE_PERCENTAGE,
            alert_threshold_percentage: DEFAULT_ALERT_THRESHOLD_PERCENTAGE,
            enabled_categories: IngredientCategory::ALL.into_iter().collect(),
        }
    }
}

impl PriceUpdateSettings {
    pub fn new(config: PriceUpdateSettingsConfig) -> Result<Self, CoreError> {
        let (now, timestamp) = generate_timestamp();

        let settings = Self {
            id: Uuid::new_v7(timestamp),
            name: config.name,
            update_frequency_hours: config.update_frequency_hours,
            min_change_percentage_to_record: config.min_change_percentage_to_record,
            alert_threshold_percentage: config.alert_threshold_percentage,
            enabled_categories: config.enabled_categories,
            last_update_run: None,
            created_at: now,
            updated_at: now,
        };
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("settings name must not be empty"));
        }
        if self.update_frequency_hours == 0 {
            return Err(CoreError::validation(
                "update frequency must be at least one hour",
            ));
        }
        if self.min_change_percentage_to_record < Decimal::ZERO {
            return Err(CoreError::validation(
                "minimum change percentage must not be negative",
            ));
        }
        if self.alert_threshold_percentage < Decimal::ZERO {
            return Err(CoreError::validation(
                "alert threshold percentage must not be negative",
            ));
        }
        Ok(())
    }

    pub fn is_category_enabled(&self, category: IngredientCategory) -> bool {
        self.enabled_categories.contains(&category)
    }
}

/// Per-ingredient check lifecycle: `Idle -> DueForCheck -> Updated | Skipped -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Idle,
    DueForCheck,
    Updated,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    SourceUnavailable(String),
    IncompatibleQuote { quoted: Unit, expected: Unit },
    BelowThreshold,
    Rejected(String),
}

/// A price reported by a price source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedPrice {
    pub price: Decimal,
    /// Unit the price is quoted per.
    pub unit: Unit,
    pub source: PriceSource,
    /// `None` when the source does not say; the check then records it at its own `now`.
    pub observed_at: Option<DateTime<Utc>>,
    pub market_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub ingredient_id: Uuid,
    pub state: CheckState,
    pub skip_reason: Option<SkipReason>,
    pub record: Option<RecordPriceOutcome>,
    pub stale_recipes: Vec<Uuid>,
}

impl CheckOutcome {
    pub(crate) fn idle(ingredient_id: Uuid) -> Self {
        Self {
            ingredient_id,
            state: CheckState::Idle,
            skip_reason: None,
            record: None,
            stale_recipes: Vec::new(),
        }
    }

    pub(crate) fn skipped(
        ingredient_id: Uuid,
        reason: SkipReason,
        record: Option<RecordPriceOutcome>,
    ) -> Self {
        Self {
            ingredient_id,
            state: CheckState::Skipped,
            skip_reason: Some(reason),
            record,
            stale_recipes: Vec::new(),
        }
    }

    pub fn raised_alert(&self) -> bool {
        self.record
            .as_ref()
            .is_some_and(|record| record.alert.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub settings_id: Uuid,
    pub ran_at: DateTime<Utc>,
    pub updated: usize,
    pub skipped: usize,
    pub idle: usize,
    pub alerts: usize,
    pub recipes_marked_stale: usize,
    pub outcomes: Vec<CheckOutcome>,
}
