//! Error taxonomy for registry operations.
//!
//! Registration and resolution failures are programming or configuration
//! errors that surface during process start-up, so every variant carries the
//! domain label and enough context to identify the offending name without
//! consulting the registry again.

use thiserror::Error;

/// Boxed error type used at the factory and loader boundaries.
///
/// Factories construct arbitrary component types and fail with arbitrary
/// error types; the registry carries those errors as trait objects and never
/// inspects them.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during registration or name resolution.
#[derive(Debug, Error)]
pub enum RegistryError {
	/// A name is already bound to a different factory.
	///
	/// Re-registering the identical factory under the same name is not a
	/// conflict; only a differing factory raises this.
	#[error("{domain} '{name}' is already registered to a different factory")]
	NameConflict { domain: String, name: String },
	/// No factory is registered under the requested name, even after all
	/// pending loaders have run. The message lists what is available; the
	/// registry never fuzzy-matches.
	#[error("unknown {domain} implementation '{name}'. Available: [{available}]")]
	NotFound {
		domain: String,
		name: String,
		available: String,
	},
	/// A factory failed during construction. The original error passes
	/// through unmodified so callers can downcast to the concrete type.
	#[error(transparent)]
	Construction(BoxError),
	/// A deferred loader failed before completing. The loader stays pending
	/// and is retried on the next resolution.
	#[error("deferred loader for the {domain} registry failed: {source}")]
	Loader {
		domain: String,
		#[source]
		source: BoxError,
	},
}
