use crate::domain::{
    common::entities::app_errors::CoreError,
    price_ledger::{entities::PriceAlert, ports::AlertNotifier},
};

/// Publishes price alerts as `warn` events for whatever subscriber the host installs.
#[derive(Debug, Clone, Default)]
pub struct TracingAlertNotifier;

impl AlertNotifier for TracingAlertNotifier {
    async fn notify(&self, alert: PriceAlert) -> Result<(), CoreError> {
        tracing::warn!(
            ingredient_id = %alert.ingredient_id,
            ingredient = %alert.ingredient_name,
            old_price = %alert.old_price,
            new_price = %alert.new_price,
            change_percentage = %alert.change_percentage,
            recorded_at = %alert.recorded_at,
            "Ingredient price alert"
        );

        Ok(())
    }
}
