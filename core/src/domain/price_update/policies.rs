use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    ingredient::entities::Ingredient,
    price_update::entities::{CheckState, PriceUpdateSettings},
};

/// Active, opted in to automatic updates, and in an enabled category.
pub fn is_eligible(ingredient: &Ingredient, settings: &PriceUpdateSettings) -> bool {
    ingredient.is_active
        && ingredient.auto_update_enabled
        && settings.is_category_enabled(ingredient.category)
}

pub fn is_due(ingredient: &Ingredient, settings: &PriceUpdateSettings, now: DateTime<Utc>) -> bool {
    match ingredient.last_price_fetch {
        None => true,
        Some(last) => {
            now - last >= Duration::hours(i64::from(settings.update_frequency_hours))
        }
    }
}

/// `DueForCheck` when the scheduler should fetch a fresh price, `Idle` otherwise.
pub fn evaluate(
    ingredient: &Ingredient,
    settings: &PriceUpdateSettings,
    now: DateTime<Utc>,
) -> CheckState {
    if is_eligible(ingredient, settings) && is_due(ingredient, settings, now) {
        CheckState::DueForCheck
    } else {
        CheckState::Idle
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::{
        ingredient::entities::{IngredientCategory, IngredientConfig, PriceSource},
        price_update::entities::PriceUpdateSettingsConfig,
        unit::value_objects::Unit,
    };

    fn ingredient(category: IngredientCategory) -> Ingredient {
        Ingredient::new(IngredientConfig {
            name: "Paneer".to_string(),
            category,
            market_price: dec!(320),
            unit: Unit::Kg,
            price_source: PriceSource::Api,
            auto_update_enabled: true,
        })
        .unwrap()
    }

    fn settings() -> PriceUpdateSettings {
        PriceUpdateSettings::new(PriceUpdateSettingsConfig {
            update_frequency_hours: 6,
            enabled_categories: [IngredientCategory::Dairy].into_iter().collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_never_fetched_is_due() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            evaluate(&ingredient(IngredientCategory::Dairy), &settings(), now),
            CheckState::DueForCheck
        );
    }

    #[test]
    fn test_due_exactly_at_frequency_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut paneer = ingredient(IngredientCategory::Dairy);

        paneer.last_price_fetch = Some(now - Duration::hours(6));
        assert!(is_due(&paneer, &settings(), now));

        paneer.last_price_fetch = Some(now - Duration::hours(6) + Duration::seconds(1));
        assert!(!is_due(&paneer, &settings(), now));
        assert_eq!(evaluate(&paneer, &settings(), now), CheckState::Idle);
    }

    #[test]
    fn test_ineligible_ingredients_stay_idle() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let spices = ingredient(IngredientCategory::Spices);
        assert_eq!(evaluate(&spices, &settings(), now), CheckState::Idle);

        let mut manual = ingredient(IngredientCategory::Dairy);
        manual.auto_update_enabled = false;
        assert!(!is_eligible(&manual, &settings()));

        let mut inactive = ingredient(IngredientCategory::Dairy);
        inactive.deactivate();
        assert!(!is_eligible(&inactive, &settings()));
    }
}
