//! Reference records used to price orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A flooring product and its per-square-foot rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
	/// Product name, e.g. "Carpet". Looked up case-insensitively.
	pub product_type: String,
	/// Material cost per square foot.
	pub cost_per_square_foot: Decimal,
	/// Labor cost per square foot.
	pub labor_cost_per_square_foot: Decimal,
}

/// Sales tax for a single state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
	/// Upper-cased two-letter abbreviation, e.g. "TX".
	pub state_abbr: String,
	/// Full state name.
	pub state_name: String,
	/// Percentage rate; `4.45` means 4.45%.
	pub tax_rate: Decimal,
}
