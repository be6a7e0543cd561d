//! Text codec for order partitions.
//!
//! A partition is a header line followed by one comma-delimited line per
//! order. Unset fields are written as empty strings. Fields containing a
//! comma or a double quote are quoted, with embedded quotes doubled.
//!
//! Surrounding whitespace is trimmed from every field on decode.
//! Decoding is tolerant: a line without a usable order number is skipped,
//! and a field that fails to parse is left unset. Each such event is
//! reported as a [`LoadWarning`] instead of failing the whole partition.

use crate::StorageError;
use chrono::NaiveDate;
use flooring_types::{format_optional, Order, PartitionKey};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

/// Header line of every partition.
pub const PARTITION_HEADER: &str = "OrderNumber,CustomerName,State,TaxRate,ProductType,Area,\
	CostPerSquareFoot,LaborCostPerSquareFoot,MaterialCost,LaborCost,Tax,Total";

/// Something that was dropped while decoding a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
	/// Date of the partition.
	pub date: NaiveDate,
	/// 1-based line number within the partition text.
	pub line: usize,
	/// What was dropped.
	pub kind: LoadWarningKind,
}

/// Kinds of [`LoadWarning`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarningKind {
	/// The line has no order number; it was skipped.
	MissingOrderNumber,
	/// The order number is not a positive integer; the line was skipped.
	InvalidOrderNumber(String),
	/// A field could not be parsed and was left unset.
	InvalidField { field: &'static str, value: String },
	/// A later line reused this order number and replaced the earlier one.
	DuplicateOrderNumber(u32),
}

impl fmt::Display for LoadWarning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} line {}: ", self.date, self.line)?;
		match &self.kind {
			LoadWarningKind::MissingOrderNumber => write!(f, "missing order number, line skipped"),
			LoadWarningKind::InvalidOrderNumber(value) => {
				write!(f, "invalid order number '{}', line skipped", value)
			},
			LoadWarningKind::InvalidField { field, value } => {
				write!(f, "invalid {} '{}', field left unset", field, value)
			},
			LoadWarningKind::DuplicateOrderNumber(number) => {
				write!(f, "order number {} repeated, earlier line replaced", number)
			},
		}
	}
}

/// Result of decoding one partition.
#[derive(Debug, Default)]
pub struct DecodedPartition {
	/// Orders keyed by order number.
	pub orders: BTreeMap<u32, Order>,
	/// Lines or fields that were dropped.
	pub warnings: Vec<LoadWarning>,
}

/// Encodes the orders of one partition, header first, in the given order.
pub fn encode_partition<'a>(
	orders: impl IntoIterator<Item = &'a Order>,
) -> Result<String, StorageError> {
	let mut out = String::from(PARTITION_HEADER);
	out.push('\n');
	for order in orders {
		out.push_str(&join_record(&order_fields(order))?);
		out.push('\n');
	}
	Ok(out)
}

/// Decodes a partition's text. The first line is treated as the header.
pub fn decode_partition(key: PartitionKey, content: &str) -> DecodedPartition {
	let date = key.date();
	let mut decoded = DecodedPartition::default();

	for (index, line) in content.lines().enumerate().skip(1) {
		if line.trim().is_empty() {
			continue;
		}
		let line_no = index + 1;
		let mut warn = |kind| decoded.warnings.push(LoadWarning { date, line: line_no, kind });

		let fields = split_record(line);
		let number_field = fields.first().map(|f| f.trim()).unwrap_or_default();
		if number_field.is_empty() {
			warn(LoadWarningKind::MissingOrderNumber);
			continue;
		}
		let order_number = match number_field.parse::<u32>() {
			Ok(n) if n > 0 => n,
			_ => {
				warn(LoadWarningKind::InvalidOrderNumber(number_field.to_string()));
				continue;
			},
		};

		let text = |i: usize| {
			fields
				.get(i)
				.map(|f| f.trim())
				.filter(|f| !f.is_empty())
				.map(str::to_string)
		};
		let mut decimal = |i: usize, field: &'static str| {
			let raw = fields.get(i).map(|f| f.trim()).unwrap_or_default();
			if raw.is_empty() {
				return None;
			}
			match raw.parse::<Decimal>() {
				Ok(value) => Some(value),
				Err(_) => {
					warn(LoadWarningKind::InvalidField {
						field,
						value: raw.to_string(),
					});
					None
				},
			}
		};

		let mut order = Order::new(order_number, date);
		order.customer_name = text(1);
		order.state = text(2);
		order.tax_rate = decimal(3, "TaxRate");
		order.product_type = text(4);
		order.area = decimal(5, "Area");
		order.cost_per_square_foot = decimal(6, "CostPerSquareFoot");
		order.labor_cost_per_square_foot = decimal(7, "LaborCostPerSquareFoot");
		order.costs.material_cost = decimal(8, "MaterialCost");
		order.costs.labor_cost = decimal(9, "LaborCost");
		order.costs.tax = decimal(10, "Tax");
		order.costs.total = decimal(11, "Total");

		if decoded.orders.insert(order_number, order).is_some() {
			decoded.warnings.push(LoadWarning {
				date,
				line: line_no,
				kind: LoadWarningKind::DuplicateOrderNumber(order_number),
			});
		}
	}

	decoded
}

/// Fields of an order in partition column order, unset fields empty.
pub(crate) fn order_fields(order: &Order) -> Vec<String> {
	vec![
		order.order_number.to_string(),
		order.customer_name.clone().unwrap_or_default(),
		order.state.clone().unwrap_or_default(),
		format_optional(order.tax_rate),
		order.product_type.clone().unwrap_or_default(),
		format_optional(order.area),
		format_optional(order.cost_per_square_foot),
		format_optional(order.labor_cost_per_square_foot),
		format_optional(order.costs.material_cost),
		format_optional(order.costs.labor_cost),
		format_optional(order.costs.tax),
		format_optional(order.costs.total),
	]
}

/// Joins fields into one line, quoting where needed.
pub(crate) fn join_record(fields: &[String]) -> Result<String, StorageError> {
	let mut line = String::new();
	for (i, field) in fields.iter().enumerate() {
		if field.contains(['\n', '\r']) {
			return Err(StorageError::Serialization(format!(
				"field '{}' contains a line break",
				field.escape_debug()
			)));
		}
		if i > 0 {
			line.push(',');
		}
		if field.contains([',', '"']) {
			line.push('"');
			line.push_str(&field.replace('"', "\"\""));
			line.push('"');
		} else {
			line.push_str(field);
		}
	}
	Ok(line)
}

/// Splits one line into fields, honoring quoted fields. Empty fields,
/// including trailing ones, are kept.
pub(crate) fn split_record(line: &str) -> Vec<String> {
	let mut fields = Vec::new();
	let mut current = String::new();
	let mut in_quotes = false;
	let mut chars = line.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'"' if in_quotes => {
				if chars.peek() == Some(&'"') {
					current.push('"');
					chars.next();
				} else {
					in_quotes = false;
				}
			},
			'"' if current.is_empty() => in_quotes = true,
			',' if !in_quotes => fields.push(std::mem::take(&mut current)),
			_ => current.push(c),
		}
	}
	fields.push(current);
	fields
}
