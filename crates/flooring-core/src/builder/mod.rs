//! Builder for constructing flooring engines from configuration.
//!
//! The partition backend is chosen by name from a set of registered
//! factory functions, so front ends decide which backends are available
//! and configuration decides which one is used.

use crate::engine::FlooringEngine;
use crate::FlooringError;
use flooring_config::Config;
use flooring_reference::{ProductCatalog, TaxTable};
use flooring_storage::{ExportWriter, OrderStore, PartitionFactory};
use std::collections::HashMap;

/// Builder for a [`FlooringEngine`] with a pluggable partition backend.
pub struct EngineBuilder {
	config: Config,
	factories: HashMap<String, PartitionFactory>,
}

impl EngineBuilder {
	/// Creates a builder with no backends registered.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			factories: HashMap::new(),
		}
	}

	/// Registers a backend factory under `name`.
	pub fn with_factory(mut self, name: impl Into<String>, factory: PartitionFactory) -> Self {
		self.factories.insert(name.into(), factory);
		self
	}

	/// Registers several backend factories, e.g. from
	/// [`flooring_storage::get_all_implementations`].
	pub fn with_factories(
		mut self,
		factories: impl IntoIterator<Item = (&'static str, PartitionFactory)>,
	) -> Self {
		for (name, factory) in factories {
			self.factories.insert(name.to_string(), factory);
		}
		self
	}

	/// Builds the engine.
	///
	/// Creates the primary backend from its table and loads both reference
	/// listings. Missing reference data is fatal.
	pub fn build(self) -> Result<FlooringEngine, FlooringError> {
		let primary = &self.config.storage.primary;
		let backend_config = self.config.storage.primary_config().ok_or_else(|| {
			FlooringError::Config(format!(
				"Primary storage '{}' not found in implementations",
				primary
			))
		})?;
		let factory = self.factories.get(primary).ok_or_else(|| {
			FlooringError::Config(format!(
				"No storage implementation registered as '{}'",
				primary
			))
		})?;

		let backend = match factory(backend_config) {
			Ok(backend) => backend,
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(FlooringError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)));
			},
		};
		// The factory has checked the table against the backend's schema
		tracing::info!(component = "storage", implementation = %primary, "Loaded");

		let reference = &self.config.reference;
		let products = ProductCatalog::load(&reference.products_path)?;
		let taxes = TaxTable::load(&reference.taxes_path)?;
		tracing::info!(
			component = "reference",
			products = products.len(),
			states = taxes.len(),
			"Loaded"
		);

		let exporter = ExportWriter::new(self.config.export.path.clone());
		Ok(FlooringEngine::new(OrderStore::new(backend), products, taxes, exporter)
			.with_future_dates_only(self.config.orders.require_future_date))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;
	use flooring_storage::get_all_implementations;
	use std::path::Path;
	use std::str::FromStr;
	use tempfile::{tempdir, TempDir};

	fn write_reference(dir: &Path) {
		std::fs::write(
			dir.join("Products.txt"),
			"ProductType,CostPerSquareFoot,LaborCostPerSquareFoot\nTile,3.50,4.15\n",
		)
		.unwrap();
		std::fs::write(
			dir.join("Taxes.txt"),
			"State,StateName,TaxRate\nTX,Texas,4.45\n",
		)
		.unwrap();
	}

	fn config(dir: &TempDir, primary: &str) -> Config {
		let root = dir.path().to_str().unwrap();
		Config::from_str(&format!(
			r#"
[storage]
primary = "{primary}"

[storage.implementations.memory]

[storage.implementations.file]
orders_path = "{root}/Orders"

[reference]
products_path = "{root}/Products.txt"
taxes_path = "{root}/Taxes.txt"

[export]
path = "{root}/Backup/DataExport.txt"

[orders]
require_future_date = false
"#
		))
		.unwrap()
	}

	#[test]
	fn test_build_with_file_backend() {
		let dir = tempdir().unwrap();
		write_reference(dir.path());

		let mut engine = EngineBuilder::new(config(&dir, "file"))
			.with_factories(get_all_implementations())
			.build()
			.unwrap();
		assert!(dir.path().join("Orders").is_dir());
		assert_eq!(engine.product_types(), vec!["Tile"]);

		// Past dates are allowed by this configuration
		let date = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
		let mut order = flooring_types::Order::new(0, date);
		order.customer_name = Some("Ada".into());
		order.state = Some("TX".into());
		order.product_type = Some("Tile".into());
		order.area = Some(rust_decimal::Decimal::ONE_HUNDRED);
		engine.place_order(order).unwrap();
		assert!(dir.path().join("Orders").join("Orders_06012020.txt").is_file());

		let summary = engine.export().unwrap();
		assert_eq!(summary.path, dir.path().join("Backup").join("DataExport.txt"));
		assert_eq!(summary.rows, 1);
	}

	#[test]
	fn test_missing_reference_data_is_fatal() {
		let dir = tempdir().unwrap();
		let result = EngineBuilder::new(config(&dir, "memory"))
			.with_factories(get_all_implementations())
			.build();
		assert!(matches!(result, Err(FlooringError::Reference(_))));
	}

	#[test]
	fn test_unregistered_backend() {
		let dir = tempdir().unwrap();
		write_reference(dir.path());
		let result = EngineBuilder::new(config(&dir, "file"))
			.with_factory(
				"memory",
				flooring_storage::implementations::memory::create_backend,
			)
			.build();
		assert!(matches!(result, Err(FlooringError::Config(msg)) if msg.contains("'file'")));
	}

	#[test]
	fn test_backend_factory_error() {
		let dir = tempdir().unwrap();
		write_reference(dir.path());
		let mut config = config(&dir, "file");
		config
			.storage
			.implementations
			.insert("file".into(), toml::from_str("orders_path = 3").unwrap());

		let result = EngineBuilder::new(config)
			.with_factories(get_all_implementations())
			.build();
		assert!(matches!(
			result,
			Err(FlooringError::Config(msg))
				if msg.starts_with("Failed to create storage implementation 'file'")
					&& msg.contains("orders_path")
		));
	}
}
