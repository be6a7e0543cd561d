//! Storage-related types for date-partitioned order persistence.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a partition token or file name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid partition key '{0}': expected an MMDDYYYY date")]
pub struct PartitionKeyError(pub String);

/// Key of one order partition: a calendar date.
///
/// Partitions are addressed by an 8-character `MMDDYYYY` token, so the
/// partition for 2025-10-29 is stored as `Orders_10292025.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(NaiveDate);

impl PartitionKey {
	/// Prefix of every partition file name.
	pub const FILE_PREFIX: &'static str = "Orders_";
	/// Extension of every partition file name, including the dot.
	pub const FILE_EXTENSION: &'static str = ".txt";
	const TOKEN_FORMAT: &'static str = "%m%d%Y";
	const TOKEN_LEN: usize = 8;

	/// Creates the key for the given date.
	///
	/// Only years 0 through 9999 fit the four-digit year of the token;
	/// any other date is rejected.
	pub fn new(date: NaiveDate) -> Result<Self, PartitionKeyError> {
		if !(0..=9999).contains(&date.year()) {
			return Err(PartitionKeyError(date.to_string()));
		}
		Ok(Self(date))
	}

	/// Returns the date this partition holds.
	pub fn date(&self) -> NaiveDate {
		self.0
	}

	/// Returns the `MMDDYYYY` token.
	pub fn token(&self) -> String {
		self.0.format(Self::TOKEN_FORMAT).to_string()
	}

	/// Returns the backing file name, e.g. `Orders_10292025.txt`.
	pub fn file_name(&self) -> String {
		format!(
			"{}{}{}",
			Self::FILE_PREFIX,
			self.token(),
			Self::FILE_EXTENSION
		)
	}

	/// Parses a backing file name. Returns `None` for names that do not
	/// follow the partition naming scheme.
	pub fn from_file_name(name: &str) -> Option<Self> {
		name.strip_prefix(Self::FILE_PREFIX)
			.and_then(|rest| rest.strip_suffix(Self::FILE_EXTENSION))
			.and_then(|token| token.parse().ok())
	}
}

impl FromStr for PartitionKey {
	type Err = PartitionKeyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.len() != Self::TOKEN_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
			return Err(PartitionKeyError(s.to_string()));
		}
		NaiveDate::parse_from_str(s, Self::TOKEN_FORMAT)
			.map(Self)
			.map_err(|_| PartitionKeyError(s.to_string()))
	}
}

impl TryFrom<NaiveDate> for PartitionKey {
	type Error = PartitionKeyError;

	fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
		Self::new(date)
	}
}

impl fmt::Display for PartitionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.token())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_and_file_name() {
		let key = PartitionKey::new(NaiveDate::from_ymd_opt(2025, 8, 21).unwrap()).unwrap();
		assert_eq!(key.token(), "08212025");
		assert_eq!(key.file_name(), "Orders_08212025.txt");
		assert_eq!(key.to_string(), "08212025");
	}

	#[test]
	fn test_from_file_name() {
		let key = PartitionKey::from_file_name("Orders_10292025.txt").unwrap();
		assert_eq!(key.date(), NaiveDate::from_ymd_opt(2025, 10, 29).unwrap());

		assert!(PartitionKey::from_file_name("Orders_10292025.bak").is_none());
		assert!(PartitionKey::from_file_name("Invoices_10292025.txt").is_none());
		assert!(PartitionKey::from_file_name("Orders_13012025.txt").is_none());
		assert!(PartitionKey::from_file_name("Orders_1029202.txt").is_none());
	}

	#[test]
	fn test_parse_rejects_garbage() {
		assert!("abcdefgh".parse::<PartitionKey>().is_err());
		assert!("02302025".parse::<PartitionKey>().is_err());
		let err = "2025-10-29".parse::<PartitionKey>().unwrap_err();
		assert!(err.to_string().contains("2025-10-29"));
	}

	#[test]
	fn test_dates_outside_four_digit_years_rejected() {
		let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
		let err = PartitionKey::new(far).unwrap_err();
		assert!(err.to_string().contains("+10000-01-01"));
		assert!(PartitionKey::try_from(NaiveDate::from_ymd_opt(-1, 12, 31).unwrap()).is_err());

		let last = PartitionKey::new(NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()).unwrap();
		assert_eq!(last.token(), "12319999");
		assert_eq!(PartitionKey::from_file_name(&last.file_name()), Some(last));
		let first = PartitionKey::new(NaiveDate::from_ymd_opt(0, 1, 1).unwrap()).unwrap();
		assert_eq!(first.token(), "01010000");
	}

	#[test]
	fn test_keys_order_by_date() {
		let earlier: PartitionKey = "12312024".parse().unwrap();
		let later: PartitionKey = "01012025".parse().unwrap();
		assert!(earlier < later);
	}
}
