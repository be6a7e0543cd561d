//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (for now only order partition backends) expose the
//! name they are referenced by in configuration together with a factory
//! function that builds them from their TOML table.

/// Base trait for implementation registries.
///
/// Each backend module provides a `Registry` struct implementing this trait,
/// so that wiring code can collect `(NAME, factory)` pairs without knowing
/// about concrete types.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "file" for `[storage.implementations.file]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
