use crate::{parse_decimal, ReferenceRecord};
use flooring_types::{normalize_product_type, Product};

impl ReferenceRecord for Product {
	const KIND: &'static str = "product";

	fn normalize_key(raw: &str) -> String {
		normalize_product_type(raw)
	}

	fn key(&self) -> String {
		normalize_product_type(&self.product_type)
	}

	fn parse_fields(fields: &[&str]) -> Result<Self, String> {
		let [product_type, cost, labor, ..] = fields else {
			return Err(format!("expected 3 fields, found {}", fields.len()));
		};
		if product_type.is_empty() {
			return Err("product type is empty".into());
		}
		Ok(Product {
			product_type: product_type.to_string(),
			cost_per_square_foot: parse_decimal(cost, "cost per square foot")?,
			labor_cost_per_square_foot: parse_decimal(labor, "labor cost per square foot")?,
		})
	}
}
