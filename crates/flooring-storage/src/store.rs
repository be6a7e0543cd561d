//! Date-partitioned order store.
//!
//! The store keeps an index of partitions keyed by date. A partition is
//! read from the backend the first time any operation touches its date and
//! stays resident afterwards. Every mutation rewrites the whole partition
//! through the backend before the index is updated, so a failed write never
//! shows up as committed. A partition left with no orders is deleted from
//! the backend rather than written empty.

use crate::codec::{decode_partition, encode_partition, LoadWarning};
use crate::{PartitionBackend, StorageError};
use chrono::NaiveDate;
use flooring_types::{Order, PartitionKey};
use std::collections::BTreeMap;

/// Residency state of one partition in the index.
#[derive(Debug, Clone, Default)]
enum Partition {
	/// Known to exist in the backend but not read yet.
	#[default]
	Unloaded,
	/// Read from the backend; may be empty.
	Loaded(BTreeMap<u32, Order>),
}

impl Partition {
	fn orders(&self) -> Option<&BTreeMap<u32, Order>> {
		match self {
			Partition::Loaded(orders) => Some(orders),
			Partition::Unloaded => None,
		}
	}
}

/// Order store backed by one partition per order date.
///
/// The index is owned exclusively by the store. Every read returns copies,
/// so changes to a returned order only take effect once it is passed back
/// to [`OrderStore::add_order`].
pub struct OrderStore {
	backend: Box<dyn PartitionBackend>,
	partitions: BTreeMap<PartitionKey, Partition>,
	warnings: Vec<LoadWarning>,
}

impl OrderStore {
	/// Creates a store over the given backend. Nothing is read until an
	/// operation needs it.
	pub fn new(backend: Box<dyn PartitionBackend>) -> Self {
		Self {
			backend,
			partitions: BTreeMap::new(),
			warnings: Vec::new(),
		}
	}

	/// Returns every order for a date, ordered by order number.
	pub fn orders_for_date(&mut self, date: NaiveDate) -> Result<Vec<Order>, StorageError> {
		Ok(self.load(partition_key(date)?)?.values().cloned().collect())
	}

	/// Returns one order by date and number.
	pub fn get_order(&mut self, date: NaiveDate, order_number: u32) -> Result<Order, StorageError> {
		self.load(partition_key(date)?)?
			.get(&order_number)
			.cloned()
			.ok_or(StorageError::NotFound { date, order_number })
	}

	/// Inserts or replaces an order in the date's partition and rewrites
	/// the partition.
	///
	/// The order's date is set to `date`. An existing order with the same
	/// number is replaced without merging.
	pub fn add_order(&mut self, date: NaiveDate, mut order: Order) -> Result<Order, StorageError> {
		if order.order_number == 0 {
			return Err(StorageError::InvalidOrder(
				"order number must be positive".into(),
			));
		}
		order.order_date = date;

		let key = partition_key(date)?;
		let mut updated = self.load(key)?.clone();
		let replaced = updated
			.insert(order.order_number, order.clone())
			.is_some();

		self.persist(key, &updated)?;
		self.partitions.insert(key, Partition::Loaded(updated));
		tracing::info!(
			date = %date,
			order_number = order.order_number,
			replaced,
			"Stored order"
		);
		Ok(order)
	}

	/// Removes an order and rewrites (or deletes) its partition.
	pub fn remove_order(
		&mut self,
		date: NaiveDate,
		order_number: u32,
	) -> Result<Order, StorageError> {
		let key = partition_key(date)?;
		let mut updated = self.load(key)?.clone();
		let removed = updated
			.remove(&order_number)
			.ok_or(StorageError::NotFound { date, order_number })?;

		self.persist(key, &updated)?;
		self.partitions.insert(key, Partition::Loaded(updated));
		tracing::info!(date = %date, order_number, "Removed order");
		Ok(removed)
	}

	/// Returns one more than the highest order number in the store, or 1
	/// when the store is empty.
	///
	/// Every partition in the backend is loaded first, so the number is
	/// unique across all dates and not only the ones touched so far.
	pub fn next_order_number(&mut self) -> Result<u32, StorageError> {
		self.load_all()?;
		let max = self
			.partitions
			.values()
			.filter_map(Partition::orders)
			.filter_map(|orders| orders.keys().next_back().copied())
			.max()
			.unwrap_or(0);
		max.checked_add(1)
			.ok_or_else(|| StorageError::InvalidOrder("order numbers exhausted".into()))
	}

	/// Returns every order in the store, ordered by date then order number.
	pub fn all_orders(&mut self) -> Result<Vec<Order>, StorageError> {
		self.load_all()?;
		Ok(self
			.partitions
			.values()
			.filter_map(Partition::orders)
			.flat_map(|orders| orders.values().cloned())
			.collect())
	}

	/// Rewrites every loaded partition. Returns how many were written.
	pub fn save_all(&mut self) -> Result<usize, StorageError> {
		let mut written = 0;
		for (key, partition) in &self.partitions {
			if let Partition::Loaded(orders) = partition {
				self.persist(*key, orders)?;
				written += 1;
			}
		}
		tracing::info!(partitions = written, "Saved all loaded partitions");
		Ok(written)
	}

	/// Returns true if the date's partition has been read into the index.
	pub fn is_loaded(&self, date: NaiveDate) -> bool {
		PartitionKey::new(date)
			.ok()
			.and_then(|key| self.partitions.get(&key))
			.and_then(Partition::orders)
			.is_some()
	}

	/// Returns the warnings collected while decoding partitions.
	pub fn load_warnings(&self) -> Vec<LoadWarning> {
		self.warnings.clone()
	}

	/// Discovers every partition in the backend and loads those not yet
	/// resident.
	fn load_all(&mut self) -> Result<(), StorageError> {
		for key in self.backend.list_partitions()? {
			self.partitions.entry(key).or_default();
		}
		let pending: Vec<PartitionKey> = self
			.partitions
			.iter()
			.filter(|(_, partition)| partition.orders().is_none())
			.map(|(key, _)| *key)
			.collect();
		for key in pending {
			self.load(key)?;
		}
		Ok(())
	}

	/// Makes a partition resident and returns its orders.
	fn load(&mut self, key: PartitionKey) -> Result<&BTreeMap<u32, Order>, StorageError> {
		if !self.is_loaded(key.date()) {
			let orders = match self.backend.read_partition(key)? {
				Some(content) => {
					let decoded = decode_partition(key, &content);
					for warning in &decoded.warnings {
						tracing::warn!(partition = %key, "{}", warning);
					}
					self.warnings.extend(decoded.warnings);
					decoded.orders
				},
				None => BTreeMap::new(),
			};
			tracing::debug!(partition = %key, orders = orders.len(), "Loaded partition");
			self.partitions.insert(key, Partition::Loaded(orders));
		}

		self.partitions
			.get(&key)
			.and_then(Partition::orders)
			.ok_or_else(|| StorageError::Backend(format!("partition {} is not resident", key)))
	}

	/// Writes a partition's orders, or deletes it when there are none.
	fn persist(&self, key: PartitionKey, orders: &BTreeMap<u32, Order>) -> Result<(), StorageError> {
		if orders.is_empty() {
			self.backend.delete_partition(key)?;
			tracing::debug!(partition = %key, "Deleted empty partition");
		} else {
			let contents = encode_partition(orders.values())?;
			self.backend.write_partition(key, &contents)?;
			tracing::debug!(partition = %key, orders = orders.len(), "Wrote partition");
		}
		Ok(())
	}
}

/// Maps a date to its partition, rejecting dates the key format cannot hold.
fn partition_key(date: NaiveDate) -> Result<PartitionKey, StorageError> {
	PartitionKey::new(date).map_err(|e| StorageError::InvalidOrder(e.to_string()))
}
