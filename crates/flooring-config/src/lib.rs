//! Configuration module for the flooring order system.
//!
//! This module provides the configuration structures for the order store,
//! the reference data files, and the export location. Configuration is
//! loaded from TOML, with `${VAR}` / `${VAR:-default}` environment
//! substitution, and validated before use.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["storage.toml", "reference.toml"]` to include other files
//! - Each top-level section must be unique across all files

mod loader;

pub use loader::ConfigLoader;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the flooring system.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Order partition storage.
	pub storage: StorageConfig,
	/// Product and tax reference data files.
	#[serde(default)]
	pub reference: ReferenceConfig,
	/// Consolidated export output.
	#[serde(default)]
	pub export: ExportConfig,
	/// Order entry rules.
	#[serde(default)]
	pub orders: OrdersConfig,
}

/// Configuration for the order partition backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of backend names to their raw TOML configuration.
	pub implementations: HashMap<String, toml::Value>,
}

impl StorageConfig {
	/// Returns the raw table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Locations of the reference data listings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferenceConfig {
	/// Products listing (`ProductType,CostPerSquareFoot,LaborCostPerSquareFoot`).
	#[serde(default = "default_products_path")]
	pub products_path: PathBuf,
	/// Taxes listing (`State,StateName,TaxRate`).
	#[serde(default = "default_taxes_path")]
	pub taxes_path: PathBuf,
}

impl Default for ReferenceConfig {
	fn default() -> Self {
		Self {
			products_path: default_products_path(),
			taxes_path: default_taxes_path(),
		}
	}
}

fn default_products_path() -> PathBuf {
	PathBuf::from("./FileData/Data/Products.txt")
}

fn default_taxes_path() -> PathBuf {
	PathBuf::from("./FileData/Data/Taxes.txt")
}

/// Configuration for the consolidated export.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
	/// File the export is written to. Parent directories are created.
	#[serde(default = "default_export_path")]
	pub path: PathBuf,
}

impl Default for ExportConfig {
	fn default() -> Self {
		Self {
			path: default_export_path(),
		}
	}
}

fn default_export_path() -> PathBuf {
	PathBuf::from("./FileData/Backup/DataExport.txt")
}

/// Rules applied when new orders are entered.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	/// New orders must be dated strictly after today.
	#[serde(default = "default_require_future_date")]
	pub require_future_date: bool,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			require_future_date: default_require_future_date(),
		}
	}
}

fn default_require_future_date() -> bool {
	true
}

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.expect("environment variable pattern is a valid regex")
});

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, and
/// `${VAR_NAME:-default}` with the value or the default when unset.
/// Inputs are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let mut resolved = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in ENV_VAR.captures_iter(input) {
		let Some(full_match) = cap.get(0) else {
			continue;
		};
		let var_name = &cap[1];
		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};

		resolved.push_str(&input[last_end..full_match.start()]);
		resolved.push_str(&value);
		last_end = full_match.end();
	}
	resolved.push_str(&input[last_end..]);

	Ok(resolved)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path.display())))?;

		let mut loader = ConfigLoader::new(base_dir);
		let config = loader.load_config(file_name)?;
		tracing::debug!(path = %path.display(), storage = %config.storage.primary, "Loaded configuration");
		Ok(config)
	}

	/// Validates cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if self.storage.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		let paths = [
			("reference.products_path", &self.reference.products_path),
			("reference.taxes_path", &self.reference.taxes_path),
			("export.path", &self.export.path),
		];
		for (name, path) in paths {
			if path.as_os_str().is_empty() {
				return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
