//! Registry trait for self-registering implementations.
//!
//! Pluggable components (account and delivery implementations) expose a
//! `Registry` type naming the configuration key they answer to and the factory
//! that builds them.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"local"` for `[account.implementations.local]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
