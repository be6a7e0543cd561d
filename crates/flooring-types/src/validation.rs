//! Validation for order fields and backend configuration tables.
//!
//! Order field rules mirror what the sales desk enforces: customer names
//! use a restricted alphabet and billable area has a floor. Configuration
//! validation checks the raw TOML table a backend is constructed from.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Minimum billable area in square feet (inclusive).
pub const MIN_AREA: Decimal = Decimal::ONE_HUNDRED;

static CUSTOMER_NAME: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^[A-Za-z.,\- ]+$").expect("customer name pattern is a valid regex")
});

/// Errors that can occur during validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A configuration field has the wrong TOML type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

impl ValidationError {
	fn invalid(field: &str, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

/// Returns true if `name` is a non-blank customer name made only of letters,
/// spaces, `.`, `,` and `-`.
pub fn is_valid_customer_name(name: &str) -> bool {
	!name.trim().is_empty() && CUSTOMER_NAME.is_match(name)
}

/// Validates a customer name.
pub fn validate_customer_name(name: &str) -> Result<(), ValidationError> {
	if name.trim().is_empty() {
		return Err(ValidationError::MissingField("customer_name".into()));
	}
	if !CUSTOMER_NAME.is_match(name) {
		return Err(ValidationError::invalid(
			"customer_name",
			"may only contain letters, spaces, '.', ',' and '-'",
		));
	}
	Ok(())
}

/// Validates that an area meets the billable minimum.
pub fn validate_area(area: Decimal) -> Result<(), ValidationError> {
	if area < MIN_AREA {
		return Err(ValidationError::invalid(
			"area",
			format!("{} is below the minimum of {} sq ft", area, MIN_AREA),
		));
	}
	Ok(())
}

/// Normalizes a state abbreviation for lookup.
pub fn normalize_state(state: &str) -> String {
	state.trim().to_uppercase()
}

/// Normalizes a product type for lookup.
pub fn normalize_product_type(product_type: &str) -> String {
	product_type.trim().to_lowercase()
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// A boolean value.
	Boolean,
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Boolean => "boolean",
		}
	}

	fn matches(&self, value: &toml::Value) -> bool {
		match self {
			FieldType::String => value.is_str(),
			FieldType::Boolean => value.is_bool(),
		}
	}
}

/// Custom check run against a field value after its type is verified.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named, typed field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		if !self.field_type.matches(value) {
			return Err(ValidationError::TypeMismatch {
				field: self.name.clone(),
				expected: self.field_type.name().to_string(),
				actual: value.type_str().to_string(),
			});
		}
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::invalid(&self.name, message))?;
		}
		Ok(())
	}
}

/// Required and optional fields of a configuration table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a schema from required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	///
	/// Required fields must be present; every present field must have the
	/// declared type and pass its custom validator. Unknown keys are allowed.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

/// A configuration schema that can validate a backend's TOML table.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
