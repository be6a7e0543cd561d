//! Reference data for pricing flooring orders.
//!
//! Two read-only tables back every order: the product catalog (unit costs
//! per square foot) and the tax table (percentage per state). Both are
//! loaded once from comma-delimited listings with a header row and stay in
//! memory until explicitly reloaded. A missing or malformed listing is a
//! fatal initialization error, since no order can be priced without it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod products;
mod taxes;

/// Product catalog keyed by lower-cased product type.
pub type ProductCatalog = ReferenceTable<flooring_types::Product>;
/// Tax table keyed by upper-cased state abbreviation.
pub type TaxTable = ReferenceTable<flooring_types::Tax>;

/// Errors that can occur while loading or querying reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
	/// The backing listing does not exist.
	#[error("{kind} data file not found: {path}")]
	Missing { kind: &'static str, path: PathBuf },
	/// The backing listing could not be read.
	#[error("Could not read {kind} data from {path}: {source}")]
	Io {
		kind: &'static str,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	/// A line of the listing could not be parsed.
	#[error("Malformed {kind} data at {path}:{line}: {message}")]
	Malformed {
		kind: &'static str,
		path: PathBuf,
		line: usize,
		message: String,
	},
	/// A lookup missed.
	#[error("{kind} not found: {key}")]
	NotFound { kind: &'static str, key: String },
}

/// A record that can be loaded into a [`ReferenceTable`].
pub trait ReferenceRecord: Clone {
	/// Human-readable name of the record kind, used in errors.
	const KIND: &'static str;

	/// Normalizes a raw lookup key.
	fn normalize_key(raw: &str) -> String;

	/// Returns the normalized key of this record.
	fn key(&self) -> String;

	/// Parses one listing line, already split into trimmed fields.
	fn parse_fields(fields: &[&str]) -> Result<Self, String>;
}

/// An immutable, in-memory lookup table of reference records.
#[derive(Debug, Clone)]
pub struct ReferenceTable<R> {
	/// Listing the table was loaded from, if any.
	source: Option<PathBuf>,
	records: BTreeMap<String, R>,
}

impl<R: ReferenceRecord> ReferenceTable<R> {
	/// Loads a table from a delimited listing. The first line is a header.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
		let path = path.as_ref();
		let records = read_listing::<R>(path)?;
		tracing::debug!(kind = R::KIND, path = %path.display(), count = records.len(), "Loaded reference data");
		if records.is_empty() {
			tracing::warn!(kind = R::KIND, path = %path.display(), "Reference data file has no records");
		}
		Ok(Self {
			source: Some(path.to_path_buf()),
			records,
		})
	}

	/// Builds a table from records already in memory.
	pub fn from_records(records: impl IntoIterator<Item = R>) -> Self {
		Self {
			source: None,
			records: records.into_iter().map(|r| (r.key(), r)).collect(),
		}
	}

	/// Re-reads the backing listing and returns the number of records.
	///
	/// The current contents are kept if the listing cannot be read. Tables
	/// built with [`ReferenceTable::from_records`] have nothing to reload.
	pub fn reload(&mut self) -> Result<usize, ReferenceError> {
		if let Some(path) = &self.source {
			self.records = read_listing::<R>(path)?;
			tracing::info!(kind = R::KIND, path = %path.display(), count = self.records.len(), "Reloaded reference data");
		}
		Ok(self.records.len())
	}

	/// Returns every record, ordered by key.
	pub fn list(&self) -> Vec<R> {
		self.records.values().cloned().collect()
	}

	/// Returns the normalized keys, in order.
	pub fn keys(&self) -> Vec<String> {
		self.records.keys().cloned().collect()
	}

	/// Looks up a record by key, normalizing it first.
	pub fn get(&self, key: &str) -> Result<R, ReferenceError> {
		self.records
			.get(&R::normalize_key(key))
			.cloned()
			.ok_or_else(|| ReferenceError::NotFound {
				kind: R::KIND,
				key: key.to_string(),
			})
	}

	/// Returns true if a record exists for the key.
	pub fn contains(&self, key: &str) -> bool {
		self.records.contains_key(&R::normalize_key(key))
	}

	/// Number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if the table holds no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

fn read_listing<R: ReferenceRecord>(path: &Path) -> Result<BTreeMap<String, R>, ReferenceError> {
	let content = std::fs::read_to_string(path).map_err(|e| {
		if e.kind() == std::io::ErrorKind::NotFound {
			ReferenceError::Missing {
				kind: R::KIND,
				path: path.to_path_buf(),
			}
		} else {
			ReferenceError::Io {
				kind: R::KIND,
				path: path.to_path_buf(),
				source: e,
			}
		}
	})?;

	let mut records = BTreeMap::new();
	for (index, line) in content.lines().enumerate().skip(1) {
		if line.trim().is_empty() {
			continue;
		}
		let fields: Vec<&str> = line.split(',').map(str::trim).collect();
		let record = R::parse_fields(&fields).map_err(|message| ReferenceError::Malformed {
			kind: R::KIND,
			path: path.to_path_buf(),
			line: index + 1,
			message,
		})?;
		records.insert(record.key(), record);
	}
	Ok(records)
}

/// Parses a decimal field of a reference listing.
pub(crate) fn parse_decimal(field: &str, name: &str) -> Result<rust_decimal::Decimal, String> {
	field
		.parse()
		.map_err(|_| format!("{} '{}' is not a decimal", name, field))
}

#[cfg(test)]
mod tests {
	use super::*;
	use flooring_types::{Product, Tax};
	use rust_decimal::Decimal;
	use std::fs;
	use std::str::FromStr;
	use tempfile::TempDir;

	const PRODUCTS: &str = "ProductType,CostPerSquareFoot,LaborCostPerSquareFoot\n\
		Carpet,2.25,2.10\n\
		Laminate,1.75,2.10\n\
		Tile,3.50,4.15\n\
		Wood,5.15,4.75\n";

	const TAXES: &str = "State,StateName,TaxRate\n\
		TX,Texas,4.45\n\
		WA,Washington,9.25\n\
		KY,Kentucky,6.00\n\
		CA,California,25.00\n";

	fn d(s: &str) -> Decimal {
		Decimal::from_str(s).unwrap()
	}

	#[test]
	fn test_load_products_case_insensitive() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("Products.txt");
		fs::write(&path, PRODUCTS).unwrap();

		let catalog = ProductCatalog::load(&path).unwrap();
		assert_eq!(catalog.len(), 4);

		let tile = catalog.get("TILE").unwrap();
		assert_eq!(tile.product_type, "Tile");
		assert_eq!(tile.cost_per_square_foot, d("3.50"));
		assert_eq!(tile.labor_cost_per_square_foot, d("4.15"));
		assert!(catalog.contains("wood"));
		assert_eq!(catalog.keys(), vec!["carpet", "laminate", "tile", "wood"]);
	}

	#[test]
	fn test_load_taxes_upper_cased() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("Taxes.txt");
		fs::write(&path, TAXES).unwrap();

		let taxes = TaxTable::load(&path).unwrap();
		let tx = taxes.get("tx").unwrap();
		assert_eq!(tx.state_abbr, "TX");
		assert_eq!(tx.state_name, "Texas");
		assert_eq!(tx.tax_rate, d("4.45"));
		assert_eq!(taxes.keys(), vec!["CA", "KY", "TX", "WA"]);
	}

	#[test]
	fn test_lookup_miss_is_not_found() {
		let taxes = TaxTable::from_records([Tax {
			state_abbr: "TX".into(),
			state_name: "Texas".into(),
			tax_rate: d("4.45"),
		}]);
		assert!(matches!(
			taxes.get("ZZ"),
			Err(ReferenceError::NotFound { kind: "tax", .. })
		));
	}

	#[test]
	fn test_missing_file_is_fatal() {
		let dir = TempDir::new().unwrap();
		let err = ProductCatalog::load(dir.path().join("absent.txt")).unwrap_err();
		assert!(matches!(err, ReferenceError::Missing { kind: "product", .. }));
	}

	#[test]
	fn test_malformed_line_names_location() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("Products.txt");
		fs::write(
			&path,
			"ProductType,CostPerSquareFoot,LaborCostPerSquareFoot\nCarpet,2.25,2.10\nTile,cheap,4.15\n",
		)
		.unwrap();

		match ProductCatalog::load(&path).unwrap_err() {
			ReferenceError::Malformed { line, message, .. } => {
				assert_eq!(line, 3);
				assert!(message.contains("cheap"));
			},
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn test_blank_lines_skipped() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("Taxes.txt");
		fs::write(&path, "State,StateName,TaxRate\n\nTX,Texas,4.45\n\n").unwrap();
		assert_eq!(TaxTable::load(&path).unwrap().len(), 1);
	}

	#[test]
	fn test_reload_picks_up_changes_and_keeps_old_on_failure() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("Products.txt");
		fs::write(&path, PRODUCTS).unwrap();
		let mut catalog = ProductCatalog::load(&path).unwrap();

		fs::write(
			&path,
			"ProductType,CostPerSquareFoot,LaborCostPerSquareFoot\nVinyl,1.10,1.20\n",
		)
		.unwrap();
		assert_eq!(catalog.reload().unwrap(), 1);
		assert!(catalog.contains("vinyl"));
		assert!(!catalog.contains("carpet"));

		fs::remove_file(&path).unwrap();
		assert!(catalog.reload().is_err());
		assert!(catalog.contains("vinyl"));
	}

	#[test]
	fn test_from_records_reload_is_noop() {
		let mut catalog = ProductCatalog::from_records([Product {
			product_type: "Carpet".into(),
			cost_per_square_foot: d("2.25"),
			labor_cost_per_square_foot: d("2.10"),
		}]);
		assert_eq!(catalog.reload().unwrap(), 1);
		assert_eq!(catalog.list()[0].product_type, "Carpet");
	}
}
