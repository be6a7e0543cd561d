//! Storage module for the flooring order system.
//!
//! Orders are persisted in partitions, one per order date. This module
//! provides the low-level partition backends (file-based and in-memory),
//! the text codec for partition contents, the [`OrderStore`] that lazily
//! loads partitions into an in-memory index, and the [`ExportWriter`] that
//! flattens every order into one consolidated listing.

use chrono::NaiveDate;
use flooring_types::{ConfigSchema, ImplementationRegistry, PartitionKey};
use thiserror::Error;

pub mod codec;
pub mod export;
pub mod store;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub use codec::{LoadWarning, LoadWarningKind};
pub use export::{ExportSummary, ExportWriter};
pub use store::OrderStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// No order with this number exists in the date's partition.
	#[error("Order {order_number} not found for {date}")]
	NotFound {
		date: NaiveDate,
		order_number: u32,
	},
	/// The order cannot be stored as given.
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
	/// A field value cannot be represented in the text format.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for partition backends.
///
/// A backend stores the encoded text of each partition under its key and
/// knows nothing about orders. An absent partition and a partition with no
/// orders are the same thing: [`PartitionBackend::read_partition`] returns
/// `None` for both.
pub trait PartitionBackend: Send + Sync {
	/// Returns the stored text of a partition, or `None` if there is none.
	fn read_partition(&self, key: PartitionKey) -> Result<Option<String>, StorageError>;

	/// Replaces the stored text of a partition.
	fn write_partition(&self, key: PartitionKey, contents: &str) -> Result<(), StorageError>;

	/// Removes a partition. Removing an absent partition succeeds.
	fn delete_partition(&self, key: PartitionKey) -> Result<(), StorageError>;

	/// Lists the keys of every stored partition, in date order.
	fn list_partitions(&self) -> Result<Vec<PartitionKey>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for partition backend factory functions.
pub type PartitionFactory = fn(&toml::Value) -> Result<Box<dyn PartitionBackend>, StorageError>;

/// Registry trait for partition backend implementations.
pub trait PartitionRegistry: ImplementationRegistry<Factory = PartitionFactory> {}

/// Get all registered partition backend implementations.
///
/// Returns `(name, factory)` pairs, used to wire the backend named in
/// configuration.
pub fn get_all_implementations() -> Vec<(&'static str, PartitionFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}
