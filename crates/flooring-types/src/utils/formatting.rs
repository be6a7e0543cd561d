//! String formatting utilities.
//!
//! Persistence writes decimals exactly as computed; rounding to cents only
//! happens here, when a value is rendered for a person to read.

use rust_decimal::{Decimal, RoundingStrategy};

/// Formats a monetary amount with exactly two decimal places.
///
/// Half-cent values round away from zero, so `68.085` renders as `68.09`.
pub fn format_money(amount: Decimal) -> String {
	let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
	rounded.rescale(2);
	rounded.to_string()
}

/// Renders an optional decimal exactly, or as an empty string when unset.
pub fn format_optional(value: Option<Decimal>) -> String {
	value.map(|v| v.to_string()).unwrap_or_default()
}
