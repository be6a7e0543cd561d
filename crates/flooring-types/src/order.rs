//! Order types for the flooring system.
//!
//! An order is one flooring job. Its input fields are captured from the
//! customer, its rate fields are snapshotted from reference data when the
//! order is created, and its cost fields are derived by the calculator.
//! Every field except the order number and date is optional so that
//! partially readable records can still be loaded from storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monetary fields derived from an order's area, rates, and tax rate.
///
/// These are replaced as a whole by the calculator and are never edited
/// field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCosts {
	/// `cost_per_square_foot * area`.
	pub material_cost: Option<Decimal>,
	/// `labor_cost_per_square_foot * area`.
	pub labor_cost: Option<Decimal>,
	/// `(material_cost + labor_cost) * tax_rate / 100`.
	pub tax: Option<Decimal>,
	/// `material_cost + labor_cost + tax`.
	pub total: Option<Decimal>,
}

impl OrderCosts {
	/// Returns true when every derived field is populated.
	pub fn is_complete(&self) -> bool {
		self.material_cost.is_some()
			&& self.labor_cost.is_some()
			&& self.tax.is_some()
			&& self.total.is_some()
	}
}

/// A single flooring order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Positive order number, unique across every date in the store.
	pub order_number: u32,
	/// Date of the order; also the partition it is stored under.
	pub order_date: NaiveDate,
	/// Customer name (letters, spaces, `.`, `,` and `-`).
	pub customer_name: Option<String>,
	/// Two-letter state abbreviation.
	pub state: Option<String>,
	/// Tax percentage snapshotted from the tax table, e.g. `4.45`.
	pub tax_rate: Option<Decimal>,
	/// Product type name.
	pub product_type: Option<String>,
	/// Billable area in square feet.
	pub area: Option<Decimal>,
	/// Material cost per square foot snapshotted from the product catalog.
	pub cost_per_square_foot: Option<Decimal>,
	/// Labor cost per square foot snapshotted from the product catalog.
	pub labor_cost_per_square_foot: Option<Decimal>,
	/// Derived monetary fields.
	#[serde(flatten)]
	pub costs: OrderCosts,
}

impl Order {
	/// Creates an empty order with only its key fields set.
	pub fn new(order_number: u32, order_date: NaiveDate) -> Self {
		Self {
			order_number,
			order_date,
			customer_name: None,
			state: None,
			tax_rate: None,
			product_type: None,
			area: None,
			cost_per_square_foot: None,
			labor_cost_per_square_foot: None,
			costs: OrderCosts::default(),
		}
	}

	/// Returns the names of the calculation inputs that are not set.
	pub fn missing_rate_fields(&self) -> Vec<&'static str> {
		let mut missing = Vec::new();
		if self.area.is_none() {
			missing.push("area");
		}
		if self.cost_per_square_foot.is_none() {
			missing.push("cost_per_square_foot");
		}
		if self.labor_cost_per_square_foot.is_none() {
			missing.push("labor_cost_per_square_foot");
		}
		if self.tax_rate.is_none() {
			missing.push("tax_rate");
		}
		missing
	}
}

impl fmt::Display for Order {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"#{} {} {}",
			self.order_number,
			self.order_date,
			self.customer_name.as_deref().unwrap_or("<unnamed>")
		)
	}
}
