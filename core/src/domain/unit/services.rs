use rust_decimal::Decimal;

use crate::domain::{common::entities::app_errors::CoreError, unit::value_objects::Unit};

/// Expresses `quantity` of `from` in `to`.
///
/// Fails with [`CoreError::IncompatibleUnit`] across families (mass, volume, count).
pub fn normalize(quantity: Decimal, from: Unit, to: Unit) -> Result<Decimal, CoreError> {
    if from.family() != to.family() {
        return Err(CoreError::IncompatibleUnit { from, to });
    }

    if from == to {
        return Ok(quantity);
    }

    Ok(quantity * from.base_factor() / to.base_factor())
}

/// Re-expresses a price quoted per `quoted_unit` as a price per `target_unit`.
pub fn convert_unit_price(
    price: Decimal,
    quoted_unit: Unit,
    target_unit: Unit,
) -> Result<Decimal, CoreError> {
    let quoted_units_per_target = normalize(Decimal::ONE, target_unit, quoted_unit)?;
    Ok(price * quoted_units_per_target)
}
