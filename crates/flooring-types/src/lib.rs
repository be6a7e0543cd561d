//! Common types module for the flooring order system.
//!
//! This module defines the core data types shared by every flooring crate:
//! orders and their derived costs, the product and tax reference records,
//! partition keys for date-partitioned storage, and validation helpers for
//! both user-facing order fields and TOML configuration tables.

/// Order types including the snapshot rates and derived cost fields.
pub mod order;
/// Product and tax reference records.
pub mod reference;
/// Registry trait for pluggable backend implementations.
pub mod registry;
/// Partition keys for date-partitioned order storage.
pub mod storage;
/// Utility functions for display formatting.
pub mod utils;
/// Domain and configuration validation.
pub mod validation;

// Re-export all types for convenient access
pub use order::*;
pub use reference::*;
pub use registry::*;
pub use storage::*;
pub use utils::{format_money, format_optional};
pub use validation::*;
