//! Core order engine for the flooring order system.
//!
//! This crate ties the reference data, the order store and the export
//! writer together behind [`FlooringEngine`], the single entry point used
//! by front ends. It also provides the pure order [`calculator`] and the
//! [`EngineBuilder`] that wires a configured partition backend.

use flooring_reference::ReferenceError;
use flooring_storage::StorageError;
use flooring_types::ValidationError;
use thiserror::Error;

pub mod builder;
pub mod calculator;
pub mod engine;

pub use builder::EngineBuilder;
pub use calculator::{calculate, CalculationError};
pub use engine::{FlooringEngine, OrderEdit, OrderRequest};

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum FlooringError {
	/// An order lookup missed.
	#[error("Not found: {0}")]
	NotFound(String),
	/// A field failed validation. Nothing was stored.
	#[error("Invalid {field}: {message}")]
	InvalidInput { field: String, message: String },
	/// Calculation was attempted without its inputs.
	#[error("Incomplete order: {0}")]
	IncompleteOrder(CalculationError),
	/// Reading or writing order data failed.
	#[error("Persistence failure: {0}")]
	Persistence(String),
	/// Reference data could not be loaded.
	#[error("Reference data error: {0}")]
	Reference(#[from] ReferenceError),
	/// The engine could not be configured.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl FlooringError {
	pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
		Self::InvalidInput {
			field: field.to_string(),
			message: message.into(),
		}
	}
}

impl From<CalculationError> for FlooringError {
	fn from(err: CalculationError) -> Self {
		match err {
			CalculationError::Overflow => {
				FlooringError::invalid("area", "order costs are too large to calculate")
			},
			incomplete => FlooringError::IncompleteOrder(incomplete),
		}
	}
}

impl From<StorageError> for FlooringError {
	fn from(err: StorageError) -> Self {
		match err {
			StorageError::NotFound { .. } => FlooringError::NotFound(err.to_string()),
			other => FlooringError::Persistence(other.to_string()),
		}
	}
}

impl From<ValidationError> for FlooringError {
	fn from(err: ValidationError) -> Self {
		match err {
			ValidationError::MissingField(field) => FlooringError::InvalidInput {
				field,
				message: "is required".into(),
			},
			ValidationError::InvalidValue { field, message } => {
				FlooringError::InvalidInput { field, message }
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => FlooringError::InvalidInput {
				field,
				message: format!("expected {}, got {}", expected, actual),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	#[test]
	fn test_storage_errors_map_to_taxonomy() {
		let missing = StorageError::NotFound {
			date: NaiveDate::from_ymd_opt(2025, 10, 29).unwrap(),
			order_number: 7,
		};
		assert!(matches!(
			FlooringError::from(missing),
			FlooringError::NotFound(msg) if msg.contains("Order 7")
		));

		let io = StorageError::Backend("disk full".into());
		assert!(matches!(
			FlooringError::from(io),
			FlooringError::Persistence(msg) if msg.contains("disk full")
		));
	}

	#[test]
	fn test_calculation_errors_map_to_taxonomy() {
		let err = FlooringError::from(CalculationError::Overflow);
		assert!(matches!(err, FlooringError::InvalidInput { ref field, .. } if field == "area"));

		let err = FlooringError::from(CalculationError::IncompleteOrder {
			missing: vec!["tax_rate"],
		});
		assert!(matches!(err, FlooringError::IncompleteOrder(_)));
		assert_eq!(err.to_string(), "Incomplete order: Order is missing tax_rate");
	}

	#[test]
	fn test_validation_errors_become_invalid_input() {
		let err = FlooringError::from(ValidationError::MissingField("customer_name".into()));
		assert_eq!(err.to_string(), "Invalid customer_name: is required");

		let err = FlooringError::from(ValidationError::InvalidValue {
			field: "area".into(),
			message: "too small".into(),
		});
		assert!(matches!(err, FlooringError::InvalidInput { ref field, .. } if field == "area"));
	}
}
