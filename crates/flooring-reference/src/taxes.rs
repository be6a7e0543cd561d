use crate::{parse_decimal, ReferenceRecord};
use flooring_types::{normalize_state, Tax};

impl ReferenceRecord for Tax {
	const KIND: &'static str = "tax";

	fn normalize_key(raw: &str) -> String {
		normalize_state(raw)
	}

	fn key(&self) -> String {
		self.state_abbr.clone()
	}

	fn parse_fields(fields: &[&str]) -> Result<Self, String> {
		let [abbr, name, rate, ..] = fields else {
			return Err(format!("expected 3 fields, found {}", fields.len()));
		};
		if abbr.is_empty() {
			return Err("state abbreviation is empty".into());
		}
		Ok(Tax {
			state_abbr: normalize_state(abbr),
			state_name: name.to_string(),
			tax_rate: parse_decimal(rate, "tax rate")?,
		})
	}
}
