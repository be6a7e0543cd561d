//! Utility functions for formatting values for display and storage.

pub mod formatting;

pub use formatting::{format_money, format_optional};
