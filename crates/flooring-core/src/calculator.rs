//! Order cost calculation.
//!
//! All arithmetic is exact decimal arithmetic. Nothing is rounded here;
//! rounding to cents happens only when a value is displayed.

use flooring_types::{Order, OrderCosts};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while calculating an order's costs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
	/// One or more calculation inputs are not set.
	#[error("Order is missing {}", .missing.join(", "))]
	IncompleteOrder { missing: Vec<&'static str> },
	/// An intermediate value does not fit in a decimal.
	#[error("Order costs overflow")]
	Overflow,
}

/// Returns a copy of `order` with its derived cost fields replaced.
///
/// Requires area, both per-square-foot rates and the tax rate:
/// - material cost = cost per square foot * area
/// - labor cost = labor cost per square foot * area
/// - tax = (material cost + labor cost) * tax rate / 100
/// - total = material cost + labor cost + tax
pub fn calculate(order: &Order) -> Result<Order, CalculationError> {
	let (Some(area), Some(cost), Some(labor_rate), Some(tax_rate)) = (
		order.area,
		order.cost_per_square_foot,
		order.labor_cost_per_square_foot,
		order.tax_rate,
	) else {
		return Err(CalculationError::IncompleteOrder {
			missing: order.missing_rate_fields(),
		});
	};

	let material_cost = cost.checked_mul(area).ok_or(CalculationError::Overflow)?;
	let labor_cost = labor_rate
		.checked_mul(area)
		.ok_or(CalculationError::Overflow)?;
	let subtotal = material_cost
		.checked_add(labor_cost)
		.ok_or(CalculationError::Overflow)?;
	let tax = subtotal
		.checked_mul(tax_rate)
		.and_then(|t| t.checked_div(Decimal::ONE_HUNDRED))
		.ok_or(CalculationError::Overflow)?;
	let total = subtotal.checked_add(tax).ok_or(CalculationError::Overflow)?;

	let mut calculated = order.clone();
	calculated.costs = OrderCosts {
		material_cost: Some(material_cost),
		labor_cost: Some(labor_cost),
		tax: Some(tax),
		total: Some(total),
	};
	Ok(calculated)
}
