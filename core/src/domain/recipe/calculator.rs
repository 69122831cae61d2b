use rust_decimal::Decimal;

use crate::domain::{
    common::{entities::app_errors::CoreError, percentage_of, round_money},
    recipe::entities::{
        CostBreakdown, IngredientUsage, MenuItemRecipe, OverheadBreakdown, OverheadCosts,
        PriceCalculation,
    },
    unit::normalize,
};

/// Costs a recipe from its frozen unit prices. Only `id` and `calculated_at`
/// of the result differ between two runs over the same recipe.
pub fn compute_cost(recipe: &MenuItemRecipe) -> Result<PriceCalculation, CoreError> {
    let breakdown = calculate_breakdown(
        &recipe.ingredients,
        &recipe.overhead_costs,
        recipe.profit_margin,
    )?;

    Ok(PriceCalculation::new(
        recipe.id,
        recipe.menu_item_id,
        breakdown,
    ))
}

/// Each derived amount is rounded to 2 dp half-up exactly once, when it is produced.
/// Sums of already rounded amounts are exact.
pub fn calculate_breakdown(
    usages: &[IngredientUsage],
    overhead: &OverheadCosts,
    profit_margin: Decimal,
) -> Result<CostBreakdown, CoreError> {
    if usages.is_empty() {
        return Err(CoreError::validation(
            "a recipe needs at least one ingredient",
        ));
    }
    if overhead.wastage_percentage < Decimal::ZERO {
        return Err(CoreError::validation(
            "wastage percentage must not be negative",
        ));
    }
    if profit_margin < Decimal::ZERO {
        return Err(CoreError::validation("profit margin must not be negative"));
    }
    for (label, charge) in [
        ("labour charge", overhead.labour_charge),
        ("rent allocation", overhead.rent_allocation),
        ("electricity charge", overhead.electricity_charge),
        ("miscellaneous", overhead.miscellaneous),
    ] {
        if charge < Decimal::ZERO {
            return Err(CoreError::validation(format!(
                "{label} must not be negative"
            )));
        }
    }

    let ingredients = usages
        .iter()
        .map(cost_usage)
        .collect::<Result<Vec<_>, _>>()?;

    let total_ingredient_cost: Decimal = ingredients.iter().map(|usage| usage.total_cost).sum();

    let wastage_amount = round_money(percentage_of(
        total_ingredient_cost,
        overhead.wastage_percentage,
    ));
    let total_overhead_cost = round_money(
        overhead.labour_charge
            + overhead.rent_allocation
            + overhead.electricity_charge
            + wastage_amount
            + overhead.miscellaneous,
    );

    let total_making_cost = total_ingredient_cost + total_overhead_cost;
    let profit_amount = round_money(percentage_of(total_making_cost, profit_margin));
    let suggested_selling_price = total_making_cost + profit_amount;

    Ok(CostBreakdown {
        ingredients,
        overhead: OverheadBreakdown {
            labour_charge: overhead.labour_charge,
            rent_allocation: overhead.rent_allocation,
            electricity_charge: overhead.electricity_charge,
            wastage_percentage: overhead.wastage_percentage,
            wastage_amount,
            miscellaneous: overhead.miscellaneous,
        },
        total_ingredient_cost,
        total_overhead_cost,
        total_making_cost,
        profit_margin,
        profit_amount,
        suggested_selling_price,
    })
}

fn cost_usage(usage: &IngredientUsage) -> Result<IngredientUsage, CoreError> {
    if usage.quantity <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "quantity of {} must be positive",
            usage.ingredient_name
        )));
    }
    if usage.unit_price <= Decimal::ZERO {
        return Err(CoreError::validation(format!(
            "unit price of {} must be positive",
            usage.ingredient_name
        )));
    }

    let quantity = normalize(usage.quantity, usage.unit, usage.price_unit)?;

    Ok(IngredientUsage {
        total_cost: round_money(quantity * usage.unit_price),
        ..usage.clone()
    })
}
