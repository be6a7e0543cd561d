//! Subcommands of the `flooring` binary.
//!
//! Each command runs against an already built engine and writes its
//! human-readable (or JSON) output to the given writer.

use chrono::NaiveDate;
use clap::Subcommand;
use flooring_core::{FlooringEngine, OrderEdit, OrderRequest};
use flooring_types::{format_money, Order};
use rust_decimal::Decimal;
use std::error::Error;
use std::io::Write;

/// Operations on the order store.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// List the orders placed for a date
	List {
		/// Order date (YYYY-MM-DD)
		#[arg(short, long)]
		date: NaiveDate,
		/// Print the orders as JSON
		#[arg(long)]
		json: bool,
	},
	/// Price a new order, and place it with --yes
	Add {
		#[arg(short, long)]
		date: NaiveDate,
		#[arg(short, long)]
		name: String,
		#[arg(short, long)]
		state: String,
		#[arg(short, long)]
		product: String,
		/// Area in square feet (at least 100)
		#[arg(short, long)]
		area: Decimal,
		/// Place the order instead of only previewing it
		#[arg(short, long)]
		yes: bool,
	},
	/// Change an order, and save the change with --yes
	Edit {
		#[arg(short, long)]
		date: NaiveDate,
		#[arg(long)]
		number: u32,
		#[arg(short, long)]
		name: Option<String>,
		#[arg(short, long)]
		state: Option<String>,
		#[arg(short, long)]
		product: Option<String>,
		#[arg(short, long)]
		area: Option<Decimal>,
		/// Save the change instead of only previewing it
		#[arg(short, long)]
		yes: bool,
	},
	/// Remove an order
	Remove {
		#[arg(short, long)]
		date: NaiveDate,
		#[arg(long)]
		number: u32,
	},
	/// Write every order to the export file
	Export,
	/// List the products on file
	Products,
	/// List the states with a tax rate on file
	Taxes,
}

/// Runs one command against the engine.
pub fn run(
	engine: &mut FlooringEngine,
	command: Command,
	out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
	match command {
		Command::List { date, json } => {
			let orders = engine.orders_for_date(date)?;
			if json {
				writeln!(out, "{}", serde_json::to_string_pretty(&orders)?)?;
				return Ok(());
			}
			if orders.is_empty() {
				writeln!(out, "No orders for {}", date)?;
			}
			for order in &orders {
				write_order(out, order)?;
			}
			let warnings = engine.load_warnings();
			if !warnings.is_empty() {
				writeln!(out, "{} stored line(s) could not be fully read", warnings.len())?;
			}
		},
		Command::Add {
			date,
			name,
			state,
			product,
			area,
			yes,
		} => {
			let request = OrderRequest {
				date,
				customer_name: name,
				state,
				product_type: product,
				area,
			};
			let order = engine.create_order(&request)?;
			if yes {
				let placed = engine.place_order(order)?;
				writeln!(out, "Placed order {}", placed.order_number)?;
				write_order(out, &placed)?;
			} else {
				writeln!(out, "Preview (not placed; pass --yes to place):")?;
				write_order(out, &order)?;
			}
		},
		Command::Edit {
			date,
			number,
			name,
			state,
			product,
			area,
			yes,
		} => {
			let edit = OrderEdit {
				customer_name: name,
				state,
				product_type: product,
				area,
			};
			if edit.is_empty() {
				return Err("nothing to change; pass --name, --state, --product or --area".into());
			}
			let order = engine.edit_order(date, number, &edit)?;
			if yes {
				let saved = engine.save_edit(order)?;
				writeln!(out, "Saved order {}", saved.order_number)?;
				write_order(out, &saved)?;
			} else {
				writeln!(out, "Preview (not saved; pass --yes to save):")?;
				write_order(out, &order)?;
			}
		},
		Command::Remove { date, number } => {
			let removed = engine.remove_order(date, number)?;
			writeln!(out, "Removed order {}", removed.order_number)?;
			write_order(out, &removed)?;
		},
		Command::Export => {
			let summary = engine.export()?;
			writeln!(
				out,
				"Exported {} order(s) to {}",
				summary.rows,
				summary.path.display()
			)?;
		},
		Command::Products => {
			for product in engine.products() {
				writeln!(
					out,
					"{:<10} material ${}/sq ft  labor ${}/sq ft",
					product.product_type,
					format_money(product.cost_per_square_foot),
					format_money(product.labor_cost_per_square_foot)
				)?;
			}
		},
		Command::Taxes => {
			for tax in engine.taxes() {
				writeln!(out, "{}  {:<12} {}%", tax.state_abbr, tax.state_name, tax.tax_rate)?;
			}
		},
	}
	Ok(())
}

fn money(value: Option<Decimal>) -> String {
	value.map(format_money).unwrap_or_else(|| "-".into())
}

fn write_order(out: &mut impl Write, order: &Order) -> std::io::Result<()> {
	writeln!(
		out,
		"#{:<5} {}  {}",
		order.order_number,
		order.order_date,
		order.customer_name.as_deref().unwrap_or("-")
	)?;
	writeln!(
		out,
		"       {} ({}%)  {}  {} sq ft",
		order.state.as_deref().unwrap_or("-"),
		order.tax_rate.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
		order.product_type.as_deref().unwrap_or("-"),
		order.area.map(|a| a.to_string()).unwrap_or_else(|| "-".into())
	)?;
	writeln!(
		out,
		"       material ${}  labor ${}  tax ${}  total ${}",
		money(order.costs.material_cost),
		money(order.costs.labor_cost),
		money(order.costs.tax),
		money(order.costs.total)
	)
}
