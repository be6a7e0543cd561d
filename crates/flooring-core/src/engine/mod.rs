//! The order engine consumed by front ends.
//!
//! [`FlooringEngine`] owns the order store, both reference tables and the
//! export writer. It validates input against the reference data, snapshots
//! rates onto orders, runs the calculator and hands finished orders to the
//! store. Front ends never touch the store directly.

use crate::calculator::calculate;
use crate::FlooringError;
use chrono::{Local, NaiveDate};
use flooring_reference::{ProductCatalog, TaxTable};
use flooring_storage::{ExportSummary, ExportWriter, LoadWarning, OrderStore};
use flooring_types::{
	format_optional, is_valid_customer_name, normalize_product_type, normalize_state,
	validate_area, validate_customer_name, Order, PartitionKey, Product, Tax,
};
use rust_decimal::Decimal;

/// Input for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
	pub date: NaiveDate,
	pub customer_name: String,
	pub state: String,
	pub product_type: String,
	pub area: Decimal,
}

/// Changes to an existing order. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderEdit {
	pub customer_name: Option<String>,
	pub state: Option<String>,
	pub product_type: Option<String>,
	pub area: Option<Decimal>,
}

impl OrderEdit {
	/// Returns true when the edit changes nothing.
	pub fn is_empty(&self) -> bool {
		self.customer_name.is_none()
			&& self.state.is_none()
			&& self.product_type.is_none()
			&& self.area.is_none()
	}
}

/// Engine that prices, stores and exports flooring orders.
pub struct FlooringEngine {
	/// Date-partitioned order storage.
	store: OrderStore,
	/// Unit costs by product type.
	products: ProductCatalog,
	/// Tax rates by state.
	taxes: TaxTable,
	/// Destination of the consolidated export.
	exporter: ExportWriter,
	/// Reject new orders dated today or earlier.
	require_future_date: bool,
}

impl FlooringEngine {
	/// Creates an engine. New orders must be dated after today unless
	/// [`FlooringEngine::with_future_dates_only`] says otherwise.
	pub fn new(
		store: OrderStore,
		products: ProductCatalog,
		taxes: TaxTable,
		exporter: ExportWriter,
	) -> Self {
		Self {
			store,
			products,
			taxes,
			exporter,
			require_future_date: true,
		}
	}

	/// Sets whether new orders must be dated strictly after today.
	pub fn with_future_dates_only(mut self, required: bool) -> Self {
		self.require_future_date = required;
		self
	}

	pub fn products(&self) -> Vec<Product> {
		self.products.list()
	}

	pub fn taxes(&self) -> Vec<Tax> {
		self.taxes.list()
	}

	/// Product names as listed in the catalog.
	pub fn product_types(&self) -> Vec<String> {
		self.products
			.list()
			.into_iter()
			.map(|p| p.product_type)
			.collect()
	}

	/// Upper-cased abbreviations of every state with a tax rate.
	pub fn state_abbreviations(&self) -> Vec<String> {
		self.taxes.keys()
	}

	pub fn is_valid_name(&self, name: &str) -> bool {
		is_valid_customer_name(name)
	}

	pub fn is_valid_state(&self, state: &str) -> bool {
		self.taxes.contains(state)
	}

	pub fn is_valid_product(&self, product_type: &str) -> bool {
		self.products.contains(product_type)
	}

	/// Returns the orders placed for a date, by order number.
	pub fn orders_for_date(&mut self, date: NaiveDate) -> Result<Vec<Order>, FlooringError> {
		Ok(self.store.orders_for_date(date)?)
	}

	pub fn get_order(&mut self, date: NaiveDate, order_number: u32) -> Result<Order, FlooringError> {
		Ok(self.store.get_order(date, order_number)?)
	}

	/// Builds and prices a new order without storing it.
	///
	/// The returned order carries the next free order number and the
	/// current tax rate and unit costs. Pass it to
	/// [`FlooringEngine::place_order`] once confirmed.
	pub fn create_order(&mut self, request: &OrderRequest) -> Result<Order, FlooringError> {
		self.check_order_date(request.date)?;
		validate_customer_name(&request.customer_name)?;
		let tax = self.lookup_tax(&request.state)?;
		let product = self.lookup_product(&request.product_type)?;
		validate_area(request.area)?;

		let order_number = self.store.next_order_number()?;
		let mut order = Order::new(order_number, request.date);
		order.customer_name = Some(request.customer_name.trim().to_string());
		order.area = Some(request.area);
		apply_tax(&mut order, &tax);
		apply_product(&mut order, &product);

		Ok(calculate(&order)?)
	}

	/// Validates, prices and stores a new order.
	///
	/// Missing rate snapshots are filled from reference data; existing
	/// ones are kept. An order number of 0 is replaced by the next free
	/// number; any other number must not be in use on any date.
	pub fn place_order(&mut self, order: Order) -> Result<Order, FlooringError> {
		self.check_order_date(order.order_date)?;
		let mut order = calculate(&self.validated(order)?)?;
		if order.order_number == 0 {
			order.order_number = self.store.next_order_number()?;
		} else if let Some(existing) = self
			.store
			.all_orders()?
			.into_iter()
			.find(|o| o.order_number == order.order_number)
		{
			return Err(FlooringError::invalid(
				"order_number",
				format!(
					"{} is already used by an order dated {}",
					existing.order_number, existing.order_date
				),
			));
		}
		let date = order.order_date;
		Ok(self.store.add_order(date, order)?)
	}

	/// Applies an edit to a stored order and reprices it without storing it.
	///
	/// A changed state refreshes the tax rate snapshot and a changed
	/// product refreshes the unit cost snapshots. Pass the result to
	/// [`FlooringEngine::save_edit`] once confirmed.
	pub fn edit_order(
		&mut self,
		date: NaiveDate,
		order_number: u32,
		edit: &OrderEdit,
	) -> Result<Order, FlooringError> {
		let mut order = self.store.get_order(date, order_number)?;

		if let Some(name) = &edit.customer_name {
			validate_customer_name(name)?;
			order.customer_name = Some(name.trim().to_string());
		}
		if let Some(state) = &edit.state {
			let tax = self.lookup_tax(state)?;
			let unchanged = order.state.as_deref().map(normalize_state).as_deref()
				== Some(tax.state_abbr.as_str());
			if unchanged {
				order.state = Some(tax.state_abbr);
			} else {
				apply_tax(&mut order, &tax);
			}
		}
		if let Some(product_type) = &edit.product_type {
			let product = self.lookup_product(product_type)?;
			let unchanged = order.product_type.as_deref().map(normalize_product_type)
				== Some(normalize_product_type(&product.product_type));
			if unchanged {
				order.product_type = Some(product.product_type);
			} else {
				apply_product(&mut order, &product);
			}
		}
		if let Some(area) = edit.area {
			validate_area(area)?;
			order.area = Some(area);
		}

		Ok(calculate(&self.validated(order)?)?)
	}

	/// Stores an edited order over the existing one.
	pub fn save_edit(&mut self, order: Order) -> Result<Order, FlooringError> {
		self.store.get_order(order.order_date, order.order_number)?;
		let order = calculate(&self.validated(order)?)?;
		let date = order.order_date;
		Ok(self.store.add_order(date, order)?)
	}

	/// Removes a stored order and records the removal on the audit log.
	pub fn remove_order(
		&mut self,
		date: NaiveDate,
		order_number: u32,
	) -> Result<Order, FlooringError> {
		let removed = self.store.remove_order(date, order_number)?;
		tracing::info!(
			target: "audit",
			action = "remove_order",
			date = %date,
			order_number,
			customer = removed.customer_name.as_deref().unwrap_or_default(),
			total = %format_optional(removed.costs.total),
			"Order removed"
		);
		Ok(removed)
	}

	/// Writes every stored order to the export file.
	pub fn export(&mut self) -> Result<ExportSummary, FlooringError> {
		let orders = self.store.all_orders()?;
		Ok(self.exporter.export_all(&orders)?)
	}

	/// Rewrites every partition read so far.
	pub fn save_all(&mut self) -> Result<usize, FlooringError> {
		Ok(self.store.save_all()?)
	}

	pub fn next_order_number(&mut self) -> Result<u32, FlooringError> {
		Ok(self.store.next_order_number()?)
	}

	/// Re-reads both reference listings.
	pub fn reload_reference_data(&mut self) -> Result<(), FlooringError> {
		let products = self.products.reload()?;
		let states = self.taxes.reload()?;
		tracing::info!(products, states, "Reloaded reference data");
		Ok(())
	}

	/// Problems found while reading stored partitions.
	pub fn load_warnings(&self) -> Vec<LoadWarning> {
		self.store.load_warnings()
	}

	fn check_order_date(&self, date: NaiveDate) -> Result<(), FlooringError> {
		if PartitionKey::new(date).is_err() {
			return Err(FlooringError::invalid(
				"order_date",
				format!("{} is outside the years 0000 to 9999", date),
			));
		}
		if !self.require_future_date {
			return Ok(());
		}
		let today = Local::now().date_naive();
		if date <= today {
			return Err(FlooringError::invalid(
				"order_date",
				format!("{} must be after today ({})", date, today),
			));
		}
		Ok(())
	}

	fn lookup_tax(&self, state: &str) -> Result<Tax, FlooringError> {
		if state.trim().is_empty() {
			return Err(FlooringError::invalid("state", "is required"));
		}
		self.taxes.get(state).map_err(|_| {
			FlooringError::invalid(
				"state",
				format!("no tax rate on file for '{}'", state.trim()),
			)
		})
	}

	fn lookup_product(&self, product_type: &str) -> Result<Product, FlooringError> {
		if product_type.trim().is_empty() {
			return Err(FlooringError::invalid("product_type", "is required"));
		}
		self.products.get(product_type).map_err(|_| {
			FlooringError::invalid(
				"product_type",
				format!("unknown product '{}'", product_type.trim()),
			)
		})
	}

	/// Checks every input field of an order and fills rate snapshots that
	/// are not set.
	fn validated(&self, mut order: Order) -> Result<Order, FlooringError> {
		validate_customer_name(order.customer_name.as_deref().unwrap_or_default())?;
		let tax = self.lookup_tax(order.state.as_deref().unwrap_or_default())?;
		let product = self.lookup_product(order.product_type.as_deref().unwrap_or_default())?;
		let area = order
			.area
			.ok_or_else(|| FlooringError::invalid("area", "is required"))?;
		validate_area(area)?;

		order.state = Some(tax.state_abbr);
		order.tax_rate.get_or_insert(tax.tax_rate);
		order.product_type = Some(product.product_type);
		order
			.cost_per_square_foot
			.get_or_insert(product.cost_per_square_foot);
		order
			.labor_cost_per_square_foot
			.get_or_insert(product.labor_cost_per_square_foot);
		Ok(order)
	}
}

fn apply_tax(order: &mut Order, tax: &Tax) {
	order.state = Some(tax.state_abbr.clone());
	order.tax_rate = Some(tax.tax_rate);
}

fn apply_product(order: &mut Order, product: &Product) {
	order.product_type = Some(product.product_type.clone());
	order.cost_per_square_foot = Some(product.cost_per_square_foot);
	order.labor_cost_per_square_foot = Some(product.labor_cost_per_square_foot);
}

#[cfg(test)]
mod tests {
	use super::*;
	use flooring_storage::codec::PARTITION_HEADER;
	use flooring_storage::implementations::memory::MemoryBackend;
	use flooring_storage::PartitionBackend;
	use std::str::FromStr;
	use tempfile::tempdir;

	fn d(s: &str) -> Decimal {
		Decimal::from_str(s).unwrap()
	}

	fn day(month: u32, day: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(2099, month, day).unwrap()
	}

	fn product(name: &str, cost: &str, labor: &str) -> Product {
		Product {
			product_type: name.into(),
			cost_per_square_foot: d(cost),
			labor_cost_per_square_foot: d(labor),
		}
	}

	fn tax(abbr: &str, name: &str, rate: &str) -> Tax {
		Tax {
			state_abbr: abbr.into(),
			state_name: name.into(),
			tax_rate: d(rate),
		}
	}

	fn engine_over(backend: MemoryBackend) -> FlooringEngine {
		let products = ProductCatalog::from_records(vec![
			product("Carpet", "2.25", "2.10"),
			product("Tile", "3.50", "4.15"),
			product("Wood", "5.15", "4.75"),
		]);
		let taxes = TaxTable::from_records(vec![
			tax("TX", "Texas", "4.45"),
			tax("WA", "Washington", "9.25"),
			tax("KY", "Kentucky", "6.00"),
		]);
		FlooringEngine::new(
			OrderStore::new(Box::new(backend)),
			products,
			taxes,
			ExportWriter::new("unused-export.txt"),
		)
	}

	fn engine() -> FlooringEngine {
		engine_over(MemoryBackend::new())
	}

	fn request(date: NaiveDate, name: &str) -> OrderRequest {
		OrderRequest {
			date,
			customer_name: name.into(),
			state: "tx".into(),
			product_type: "tile".into(),
			area: d("200"),
		}
	}

	fn invalid_field(err: FlooringError) -> String {
		match err {
			FlooringError::InvalidInput { field, .. } => field,
			other => panic!("expected invalid input, got {other:?}"),
		}
	}

	#[test]
	fn test_create_order_prices_without_storing() {
		let mut engine = engine();
		let order = engine.create_order(&request(day(1, 15), "Doctor Who")).unwrap();

		assert_eq!(order.order_number, 1);
		assert_eq!(order.state.as_deref(), Some("TX"));
		assert_eq!(order.product_type.as_deref(), Some("Tile"));
		assert_eq!(order.tax_rate, Some(d("4.45")));
		assert_eq!(order.costs.material_cost, Some(d("700.00")));
		assert_eq!(order.costs.labor_cost, Some(d("830.00")));
		assert_eq!(order.costs.tax, Some(d("68.085")));
		assert_eq!(order.costs.total, Some(d("1598.085")));

		assert!(engine.orders_for_date(day(1, 15)).unwrap().is_empty());
	}

	#[test]
	fn test_create_order_validation() {
		let mut engine = engine();

		let mut bad = request(day(1, 15), "R2-D2");
		assert_eq!(invalid_field(engine.create_order(&bad).unwrap_err()), "customer_name");

		bad = request(day(1, 15), "Ace, Inc.");
		bad.state = "ZZ".into();
		assert_eq!(invalid_field(engine.create_order(&bad).unwrap_err()), "state");

		bad = request(day(1, 15), "Ace, Inc.");
		bad.product_type = "Marble".into();
		assert_eq!(invalid_field(engine.create_order(&bad).unwrap_err()), "product_type");

		bad = request(day(1, 15), "Ace, Inc.");
		bad.area = d("99.99");
		assert_eq!(invalid_field(engine.create_order(&bad).unwrap_err()), "area");

		bad.area = d("100");
		assert!(engine.create_order(&bad).is_ok());
	}

	#[test]
	fn test_create_order_requires_future_date() {
		let past = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
		let mut engine = engine();
		assert_eq!(
			invalid_field(engine.create_order(&request(past, "Ada")).unwrap_err()),
			"order_date"
		);

		let mut engine = engine.with_future_dates_only(false);
		assert!(engine.create_order(&request(past, "Ada")).is_ok());
	}

	#[test]
	fn test_place_order_allocates_global_numbers() {
		let mut engine = engine();
		let first = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		engine.place_order(first).unwrap();
		let second = engine.create_order(&request(day(2, 1), "Grace")).unwrap();
		assert_eq!(second.order_number, 2);
		engine.place_order(second).unwrap();

		assert_eq!(engine.next_order_number().unwrap(), 3);
		assert_eq!(engine.get_order(day(2, 1), 2).unwrap().customer_name.as_deref(), Some("Grace"));
	}

	#[test]
	fn test_place_order_rejects_number_in_use_on_another_date() {
		let mut engine = engine();
		let first = engine.create_order(&request(day(1, 10), "Ada")).unwrap();
		// Both previews are handed the same free number
		let second = engine.create_order(&request(day(1, 11), "Grace")).unwrap();
		assert_eq!(first.order_number, second.order_number);

		engine.place_order(first).unwrap();
		assert_eq!(
			invalid_field(engine.place_order(second.clone()).unwrap_err()),
			"order_number"
		);
		assert!(engine.orders_for_date(day(1, 11)).unwrap().is_empty());

		// Asking for a fresh number places it
		let renumbered = engine.place_order(Order {
			order_number: 0,
			..second
		})
		.unwrap();
		assert_eq!(renumbered.order_number, 2);
	}

	#[test]
	fn test_create_order_rejects_dates_beyond_year_9999() {
		let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
		let mut engine = engine();
		assert_eq!(
			invalid_field(engine.create_order(&request(far, "Ada")).unwrap_err()),
			"order_date"
		);

		let mut order = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		order.order_date = far;
		assert_eq!(invalid_field(engine.place_order(order).unwrap_err()), "order_date");
		assert_eq!(engine.next_order_number().unwrap(), 1);
	}

	#[test]
	fn test_place_order_fills_snapshots_and_number() {
		let mut engine = engine();
		let mut order = Order::new(0, day(3, 1));
		order.customer_name = Some("Linus".into());
		order.state = Some("ky".into());
		order.product_type = Some("WOOD".into());
		order.area = Some(d("100"));

		let placed = engine.place_order(order).unwrap();
		assert_eq!(placed.order_number, 1);
		assert_eq!(placed.state.as_deref(), Some("KY"));
		assert_eq!(placed.product_type.as_deref(), Some("Wood"));
		assert_eq!(placed.cost_per_square_foot, Some(d("5.15")));
		assert_eq!(placed.costs.total, Some(d("1049.40")));
		assert_eq!(engine.orders_for_date(day(3, 1)).unwrap(), vec![placed]);
	}

	#[test]
	fn test_edit_refreshes_snapshots_only_on_change() {
		let mut engine = engine();
		let mut order = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		// An older rate stays with the order until its state changes
		order.tax_rate = Some(d("4.00"));
		engine.place_order(order).unwrap();

		let same_state = OrderEdit {
			state: Some("tx".into()),
			..OrderEdit::default()
		};
		let edited = engine.edit_order(day(1, 15), 1, &same_state).unwrap();
		assert_eq!(edited.tax_rate, Some(d("4.00")));

		let new_state = OrderEdit {
			state: Some("WA".into()),
			product_type: Some("carpet".into()),
			area: Some(d("150")),
			..OrderEdit::default()
		};
		let edited = engine.edit_order(day(1, 15), 1, &new_state).unwrap();
		assert_eq!(edited.state.as_deref(), Some("WA"));
		assert_eq!(edited.tax_rate, Some(d("9.25")));
		assert_eq!(edited.cost_per_square_foot, Some(d("2.25")));
		assert_eq!(edited.costs.material_cost, Some(d("337.50")));
		assert_eq!(edited.costs.labor_cost, Some(d("315.00")));

		// Not stored until saved
		let stored = engine.get_order(day(1, 15), 1).unwrap();
		assert_eq!(stored.state.as_deref(), Some("TX"));

		let saved = engine.save_edit(edited.clone()).unwrap();
		assert_eq!(saved, edited);
		assert_eq!(engine.get_order(day(1, 15), 1).unwrap(), edited);
	}

	#[test]
	fn test_edit_rejects_invalid_values() {
		let mut engine = engine();
		let order = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		engine.place_order(order).unwrap();

		let edit = OrderEdit {
			area: Some(d("50")),
			..OrderEdit::default()
		};
		assert_eq!(invalid_field(engine.edit_order(day(1, 15), 1, &edit).unwrap_err()), "area");

		let edit = OrderEdit {
			customer_name: Some("Ada 2".into()),
			..OrderEdit::default()
		};
		assert_eq!(
			invalid_field(engine.edit_order(day(1, 15), 1, &edit).unwrap_err()),
			"customer_name"
		);

		assert!(matches!(
			engine.edit_order(day(1, 15), 9, &OrderEdit::default()),
			Err(FlooringError::NotFound(_))
		));
	}

	#[test]
	fn test_save_edit_requires_existing_order() {
		let mut engine = engine();
		let order = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		assert!(matches!(
			engine.save_edit(order),
			Err(FlooringError::NotFound(_))
		));
		assert!(engine.orders_for_date(day(1, 15)).unwrap().is_empty());
	}

	#[test]
	fn test_remove_order() {
		let mut engine = engine();
		let order = engine.create_order(&request(day(1, 15), "Ada")).unwrap();
		let placed = engine.place_order(order).unwrap();

		assert_eq!(engine.remove_order(day(1, 15), 1).unwrap(), placed);
		assert!(matches!(
			engine.remove_order(day(1, 15), 1),
			Err(FlooringError::NotFound(_))
		));
		assert_eq!(engine.next_order_number().unwrap(), 1);
	}

	#[test]
	fn test_export_writes_all_dates() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("Backup").join("DataExport.txt");
		let mut engine = engine();
		engine.exporter = ExportWriter::new(&path);

		for (date, name) in [(day(2, 1), "Grace"), (day(1, 15), "Ada")] {
			let order = engine.create_order(&request(date, name)).unwrap();
			engine.place_order(order).unwrap();
		}

		let summary = engine.export().unwrap();
		assert_eq!(summary.rows, 2);
		let text = std::fs::read_to_string(&path).unwrap();
		let lines: Vec<&str> = text.lines().collect();
		assert!(lines[1].starts_with("2099-01-15,2,Ada,TX,4.45,Tile,200,"));
		assert!(lines[2].starts_with("2099-02-01,1,Grace,"));
	}

	#[test]
	fn test_load_warnings_surface_bad_lines() {
		let backend = MemoryBackend::new();
		backend
			.write_partition(
				PartitionKey::new(day(1, 15)).unwrap(),
				&format!("{}\n,Nobody,TX\n4,Ada,TX,abc,Tile,200,3.50,4.15,,,,\n", PARTITION_HEADER),
			)
			.unwrap();

		let mut engine = engine_over(backend);
		let orders = engine.orders_for_date(day(1, 15)).unwrap();
		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].tax_rate, None);
		assert_eq!(engine.load_warnings().len(), 2);

		// A partial order is repaired from reference data when edited
		let edit = OrderEdit {
			area: Some(d("200")),
			..OrderEdit::default()
		};
		let repaired = engine.edit_order(day(1, 15), 4, &edit).unwrap();
		assert_eq!(repaired.tax_rate, Some(d("4.45")));
		assert_eq!(repaired.costs.total, Some(d("1598.085")));
	}

	#[test]
	fn test_edit_order_with_padded_stored_fields() {
		let backend = MemoryBackend::new();
		backend
			.write_partition(
				PartitionKey::new(day(1, 15)).unwrap(),
				&format!("{}\n4, Ada , TX ,4.45, Tile ,200,3.50,4.15,,,,\n", PARTITION_HEADER),
			)
			.unwrap();

		let mut engine = engine_over(backend);
		let edit = OrderEdit {
			area: Some(d("100")),
			..OrderEdit::default()
		};
		let order = engine.edit_order(day(1, 15), 4, &edit).unwrap();
		let saved = engine.save_edit(order).unwrap();
		assert_eq!(saved.state.as_deref(), Some("TX"));
		assert_eq!(saved.product_type.as_deref(), Some("Tile"));
		assert!(engine.load_warnings().is_empty());
	}

	#[test]
	fn test_lookups() {
		let engine = engine();
		assert_eq!(engine.product_types(), vec!["Carpet", "Tile", "Wood"]);
		assert_eq!(engine.state_abbreviations(), vec!["KY", "TX", "WA"]);
		assert!(engine.is_valid_product("carpet"));
		assert!(engine.is_valid_state(" wa "));
		assert!(!engine.is_valid_state("NY"));
		assert!(!engine.is_valid_name("O'Brien"));
		assert!(engine.is_valid_name("Smith, Jr."));
		// In-memory tables have no listing to reread
		let mut engine = engine;
		engine.reload_reference_data().unwrap();
		assert_eq!(engine.products().len(), 3);
		assert_eq!(engine.taxes().len(), 3);
	}
}
