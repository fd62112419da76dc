//! Name-keyed factory registries for the crucible training framework.
//!
//! Every pluggable component domain (models, optimizers, callbacks, ...) is
//! backed by one [`Registry`] instance that maps configuration names to
//! factory functions. Registration can happen eagerly ([`Registry::add`],
//! [`Registry::add_from_module`]) or be deferred ([`Registry::late_add`]),
//! which lets independent layers contribute entries to the same logical
//! registry without depending on each other at build time: a loader added by
//! a higher layer only runs the first time a name is actually resolved.

mod error;
mod registry;
mod source;

pub use error::{BoxError, RegistryError};
pub use registry::{Entries, Factory, Registry};
pub use source::FactorySource;
