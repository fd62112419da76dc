//! The per-domain registry bundle.
//!
//! One [`Registry`] per pluggable domain, held together in a single struct
//! that is created once at process start and passed by reference to whatever
//! resolves configuration names. Layers never create a second registry for a
//! domain (that would fragment the namespace); they extend this bundle's
//! instances, eagerly or via deferred loaders.

use crucible_registry::{Registry, RegistryError};

use crate::builtins;
use crate::callbacks;
use crate::components::{
	BoxedCallback, BoxedCriterion, BoxedGradClipper, BoxedModel, BoxedOptimizer, BoxedSampler,
	BoxedScheduler, BoxedTransform,
};

/// All component registries of the framework, one per domain.
pub struct ComponentRegistries {
	pub models: Registry<BoxedModel>,
	pub optimizers: Registry<BoxedOptimizer>,
	pub schedulers: Registry<BoxedScheduler>,
	pub criteria: Registry<BoxedCriterion>,
	pub samplers: Registry<BoxedSampler>,
	pub transforms: Registry<BoxedTransform>,
	pub grad_clippers: Registry<BoxedGradClipper>,
	pub callbacks: Registry<BoxedCallback>,
}

impl ComponentRegistries {
	/// Creates an empty bundle.
	pub fn new() -> Self {
		Self {
			models: Registry::new("model"),
			optimizers: Registry::new("optimizer"),
			schedulers: Registry::new("scheduler"),
			criteria: Registry::new("criterion"),
			samplers: Registry::new("sampler"),
			transforms: Registry::new("transform"),
			grad_clippers: Registry::new("grad_clipper"),
			callbacks: Registry::new("callback"),
		}
	}

	/// Creates a bundle populated with the built-in implementations.
	pub fn with_builtins() -> Result<Self, RegistryError> {
		let registries = Self::new();
		registries.register_builtins()?;
		Ok(registries)
	}

	/// Registers every built-in implementation into this bundle.
	///
	/// All non-callback domains are populated eagerly from their candidate
	/// lists. Callbacks are only declared here: a deferred loader is added
	/// and runs the first time a callback name is resolved, so layers built
	/// on top of this one can contribute their own callback loaders to the
	/// same registry before anything is materialized.
	pub fn register_builtins(&self) -> Result<(), RegistryError> {
		self.models.add_from_module(builtins::models::candidates())?;
		self.optimizers
			.add_from_module(builtins::optimizers::candidates())?;
		self.schedulers
			.add_from_module(builtins::schedulers::candidates())?;
		self.criteria
			.add_from_module(builtins::criteria::candidates())?;
		self.samplers
			.add_from_module(builtins::samplers::candidates())?;
		self.transforms
			.add_from_module(builtins::transforms::candidates())?;
		self.grad_clippers
			.add_from_module(builtins::clippers::candidates())?;

		self.callbacks.late_add(|entries| {
			entries.add_from_module(callbacks::candidates())?;
			Ok(())
		});
		Ok(())
	}
}

impl Default for ComponentRegistries {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn empty_params() -> toml::Value {
		toml::Value::Table(toml::map::Map::new())
	}

	#[test]
	fn builtins_populate_every_domain() {
		let registries = ComponentRegistries::with_builtins().unwrap();

		assert_eq!(registries.models.all_keys().unwrap(), vec!["linear", "mlp"]);
		assert_eq!(
			registries.optimizers.all_keys().unwrap(),
			vec!["adam", "lookahead", "sgd"]
		);
		assert_eq!(
			registries.criteria.all_keys().unwrap(),
			vec!["mae", "mse"]
		);
		assert_eq!(
			registries.callbacks.all_keys().unwrap(),
			vec!["early_stopping", "timer"]
		);
	}

	#[test]
	fn registering_builtins_twice_is_idempotent() {
		let registries = ComponentRegistries::with_builtins().unwrap();
		registries.register_builtins().unwrap();
		assert_eq!(registries.models.all_keys().unwrap(), vec!["linear", "mlp"]);
	}

	#[test]
	fn builds_components_by_name() {
		let registries = ComponentRegistries::with_builtins().unwrap();

		let params: toml::Value = "in_features = 4\nout_features = 2".parse().unwrap();
		let model = registries.models.get_instance("linear", &params).unwrap();
		assert_eq!(model.num_parameters(), 10);

		let sampler = registries
			.samplers
			.get_instance("sequential", &empty_params())
			.unwrap();
		assert_eq!(sampler.order(3), vec![0, 1, 2]);
	}

	#[test]
	fn every_builtin_optimizer_constructs_with_lr() {
		let registries = ComponentRegistries::with_builtins().unwrap();

		for name in registries.optimizers.all_keys().unwrap() {
			let params: toml::Value = if name == "lookahead" {
				"lr = 0.001\ninner = { name = \"sgd\", params = { lr = 0.001 } }"
					.parse()
					.unwrap()
			} else {
				"lr = 0.001".parse().unwrap()
			};
			let optimizer = registries.optimizers.get_instance(&name, &params).unwrap();
			assert_eq!(optimizer.lr(), 0.001);
		}
	}
}
