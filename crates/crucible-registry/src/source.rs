//! Self-describing factory sources.

use crate::registry::Factory;

/// Trait for component implementations that carry their own registration
/// name.
///
/// Implementations declare the name used in configuration files to reference
/// them together with the factory that builds them, for example:
/// - "sgd" for the plain gradient-descent optimizer
/// - "early_stopping" for the early-stopping callback
///
/// [`Registry::add_source`](crate::Registry::add_source) registers a source
/// without the caller spelling the name out a second time.
pub trait FactorySource {
	/// The name used in configuration files to reference this implementation.
	const NAME: &'static str;

	/// The component type the factory produces.
	type Component;

	/// Returns the factory function for this implementation.
	fn factory() -> Factory<Self::Component>;
}
