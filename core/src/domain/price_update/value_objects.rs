use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ingredient::entities::IngredientCategory;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePriceSettingsInput {
    pub name: Option<String>,
    pub update_frequency_hours: Option<u32>,
    pub min_change_percentage_to_record: Option<Decimal>,
    pub alert_threshold_percentage: Option<Decimal>,
    pub enabled_categories: Option<BTreeSet<IngredientCategory>>,
}
