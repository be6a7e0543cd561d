//! Consolidated export of every order.
//!
//! The export is one text file holding all orders, grouped by date in
//! ascending order and by order number within each date. It uses the
//! partition line format with the order date prepended.

use crate::codec::{join_record, order_fields};
use crate::StorageError;
use chrono::NaiveDate;
use flooring_types::Order;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Header line of the export file.
pub const EXPORT_HEADER: &str = "OrderDate,OrderNumber,CustomerName,State,TaxRate,ProductType,\
	Area,CostPerSquareFoot,LaborCostPerSquareFoot,MaterialCost,LaborCost,Tax,Total";

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
	/// File the export was written to.
	pub path: PathBuf,
	/// Number of order rows written.
	pub rows: usize,
}

/// Writes the consolidated export to a fixed location.
#[derive(Debug, Clone)]
pub struct ExportWriter {
	path: PathBuf,
}

impl ExportWriter {
	/// Creates a writer targeting `path`.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Target file of this writer.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes every order to the export file, replacing its contents.
	/// Parent directories are created as needed.
	pub fn export_all(&self, orders: &[Order]) -> Result<ExportSummary, StorageError> {
		let (contents, rows) = render_export(orders)?;

		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| {
				StorageError::Backend(format!(
					"Could not create export directory {}: {}",
					parent.display(),
					e
				))
			})?;
		}

		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, contents)
			.and_then(|_| fs::rename(&temp_path, &self.path))
			.map_err(|e| {
				StorageError::Backend(format!(
					"Failed to export data to {}: {}",
					self.path.display(),
					e
				))
			})?;

		tracing::info!(path = %self.path.display(), rows, "Exported orders");
		Ok(ExportSummary {
			path: self.path.clone(),
			rows,
		})
	}
}

/// Renders the export text and returns it with the number of rows.
///
/// Orders sharing a date and number collapse to the last one given.
pub fn render_export(orders: &[Order]) -> Result<(String, usize), StorageError> {
	let mut grouped: BTreeMap<NaiveDate, BTreeMap<u32, &Order>> = BTreeMap::new();
	for order in orders {
		grouped
			.entry(order.order_date)
			.or_default()
			.insert(order.order_number, order);
	}

	let mut out = String::from(EXPORT_HEADER);
	out.push('\n');
	let mut rows = 0;
	for (date, by_number) in &grouped {
		for order in by_number.values() {
			let mut fields = vec![date.to_string()];
			fields.extend(order_fields(order));
			out.push_str(&join_record(&fields)?);
			out.push('\n');
			rows += 1;
		}
	}
	Ok((out, rows))
}
