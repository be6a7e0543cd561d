//! File-based partition backend.
//!
//! Each partition is a text file named `Orders_MMDDYYYY.txt` inside one
//! orders directory. Writes go to a temporary file that is then renamed
//! over the partition file, so a partition is never left half-written.

use crate::{PartitionBackend, PartitionFactory, PartitionRegistry, StorageError};
use flooring_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, PartitionKey, Schema, ValidationError,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default directory for partition files.
pub const DEFAULT_ORDERS_PATH: &str = "./FileData/Orders";

/// File-based partition storage.
#[derive(Debug, Clone)]
pub struct FileBackend {
	/// Directory holding the partition files.
	orders_path: PathBuf,
}

impl FileBackend {
	/// Creates a backend over the given directory. The directory is created
	/// on first write if it does not exist.
	pub fn new(orders_path: impl Into<PathBuf>) -> Self {
		Self {
			orders_path: orders_path.into(),
		}
	}

	/// Directory holding the partition files.
	pub fn orders_path(&self) -> &Path {
		&self.orders_path
	}

	fn partition_path(&self, key: PartitionKey) -> PathBuf {
		self.orders_path.join(key.file_name())
	}

	fn ensure_dir(&self) -> Result<(), StorageError> {
		fs::create_dir_all(&self.orders_path).map_err(|e| {
			StorageError::Backend(format!(
				"Could not create orders directory {}: {}",
				self.orders_path.display(),
				e
			))
		})
	}
}

impl PartitionBackend for FileBackend {
	fn read_partition(&self, key: PartitionKey) -> Result<Option<String>, StorageError> {
		let path = self.partition_path(key);
		match fs::read_to_string(&path) {
			Ok(content) => Ok(Some(content)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(format!(
				"Could not read orders file {}: {}",
				path.display(),
				e
			))),
		}
	}

	fn write_partition(&self, key: PartitionKey, contents: &str) -> Result<(), StorageError> {
		self.ensure_dir()?;
		let path = self.partition_path(key);

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, contents).map_err(|e| {
			StorageError::Backend(format!(
				"Could not write orders file {}: {}",
				temp_path.display(),
				e
			))
		})?;
		fs::rename(&temp_path, &path).map_err(|e| {
			// Best effort; the rename error is the one worth reporting
			let _ = fs::remove_file(&temp_path);
			StorageError::Backend(format!(
				"Could not replace orders file {}: {}",
				path.display(),
				e
			))
		})
	}

	fn delete_partition(&self, key: PartitionKey) -> Result<(), StorageError> {
		let path = self.partition_path(key);
		match fs::remove_file(&path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(format!(
				"Could not delete orders file {}: {}",
				path.display(),
				e
			))),
		}
	}

	fn list_partitions(&self) -> Result<Vec<PartitionKey>, StorageError> {
		let entries = match fs::read_dir(&self.orders_path) {
			Ok(entries) => entries,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => {
				return Err(StorageError::Backend(format!(
					"Could not list orders directory {}: {}",
					self.orders_path.display(),
					e
				)))
			},
		};

		let mut keys = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| StorageError::Backend(e.to_string()))?;
			let name = entry.file_name();
			match name.to_str().and_then(PartitionKey::from_file_name) {
				Some(key) if entry.path().is_file() => keys.push(key),
				_ => tracing::trace!(file = ?name, "Ignoring non-partition file"),
			}
		}
		keys.sort();
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileBackendSchema)
	}
}

/// Configuration schema for FileBackend.
pub struct FileBackendSchema;

impl ConfigSchema for FileBackendSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("orders_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if path.trim().is_empty() => {
							Err("orders_path cannot be empty".into())
						},
						_ => Ok(()),
					}
				}),
				Field::new("create_dir", FieldType::Boolean),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file backend from configuration.
///
/// Configuration parameters:
/// - `orders_path`: directory for partition files (default: "./FileData/Orders")
/// - `create_dir`: create the directory up front (default: true)
pub fn create_backend(config: &toml::Value) -> Result<Box<dyn PartitionBackend>, StorageError> {
	FileBackendSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let orders_path = config
		.get("orders_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_ORDERS_PATH);
	let create_dir = config
		.get("create_dir")
		.and_then(|v| v.as_bool())
		.unwrap_or(true);

	let backend = FileBackend::new(orders_path);
	if create_dir {
		backend.ensure_dir()?;
	}
	Ok(Box::new(backend))
}

/// Registry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = PartitionFactory;

	fn factory() -> Self::Factory {
		create_backend
	}
}

impl PartitionRegistry for Registry {}
