//! In-memory partition backend.
//!
//! Useful for tests and for dry runs where nothing should touch the disk.
//! Clones share the same underlying map, so a second store built over a
//! clone sees what the first one wrote, as it would after a restart.

use crate::{PartitionBackend, PartitionFactory, PartitionRegistry, StorageError};
use flooring_types::{ConfigSchema, ImplementationRegistry, PartitionKey, Schema, ValidationError};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// In-memory partition storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
	/// Encoded partitions keyed by date.
	partitions: Arc<RwLock<BTreeMap<PartitionKey, String>>>,
}

impl MemoryBackend {
	/// Creates an empty backend.
	pub fn new() -> Self {
		Self::default()
	}
}

fn poisoned<T>(_: T) -> StorageError {
	StorageError::Backend("memory backend lock poisoned".into())
}

impl PartitionBackend for MemoryBackend {
	fn read_partition(&self, key: PartitionKey) -> Result<Option<String>, StorageError> {
		let partitions = self.partitions.read().map_err(poisoned)?;
		Ok(partitions.get(&key).cloned())
	}

	fn write_partition(&self, key: PartitionKey, contents: &str) -> Result<(), StorageError> {
		let mut partitions = self.partitions.write().map_err(poisoned)?;
		partitions.insert(key, contents.to_string());
		Ok(())
	}

	fn delete_partition(&self, key: PartitionKey) -> Result<(), StorageError> {
		let mut partitions = self.partitions.write().map_err(poisoned)?;
		partitions.remove(&key);
		Ok(())
	}

	fn list_partitions(&self) -> Result<Vec<PartitionKey>, StorageError> {
		let partitions = self.partitions.read().map_err(poisoned)?;
		Ok(partitions.keys().copied().collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryBackendSchema)
	}
}

/// Configuration schema for MemoryBackend.
pub struct MemoryBackendSchema;

impl ConfigSchema for MemoryBackendSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// No settings; only the table shape is checked
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create a memory backend from configuration.
pub fn create_backend(_config: &toml::Value) -> Result<Box<dyn PartitionBackend>, StorageError> {
	Ok(Box::new(MemoryBackend::new()))
}

/// Registry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = PartitionFactory;

	fn factory() -> Self::Factory {
		create_backend
	}
}

impl PartitionRegistry for Registry {}
