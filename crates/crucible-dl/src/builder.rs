//! Config-driven component assembly.
//!
//! Resolves every component name a [`Config`] mentions through the shared
//! registry bundle and assembles the constructed components into one struct.
//! This is the point where registration errors, unknown names and factory
//! failures all surface; nothing long-running has started yet.

use crucible_config::{Config, ConfigError};
use crucible_core::components::{
	BoxedCallback, BoxedCriterion, BoxedGradClipper, BoxedModel, BoxedOptimizer, BoxedSampler,
	BoxedScheduler, BoxedTransform,
};
use crucible_core::ComponentRegistries;
use crucible_registry::RegistryError;
use thiserror::Error;

/// Errors that can occur while assembling an experiment from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
	/// Name resolution or construction failed.
	#[error(transparent)]
	Registry(#[from] RegistryError),
	/// The configuration itself is invalid.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Every constructed component of one experiment stage.
pub struct TrainingAssembly {
	pub model: BoxedModel,
	pub optimizer: BoxedOptimizer,
	pub criterion: BoxedCriterion,
	pub sampler: BoxedSampler,
	pub scheduler: Option<BoxedScheduler>,
	pub grad_clipper: Option<BoxedGradClipper>,
	/// Transforms in application order.
	pub transforms: Vec<BoxedTransform>,
	/// Callbacks sorted by their declared execution order.
	pub callbacks: Vec<BoxedCallback>,
}

impl std::fmt::Debug for TrainingAssembly {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TrainingAssembly").finish_non_exhaustive()
	}
}

/// Resolves and constructs every component named by `config`.
pub fn build_components(
	registries: &ComponentRegistries,
	config: &Config,
) -> Result<TrainingAssembly, BuildError> {
	config.validate()?;

	let model = registries
		.models
		.get_instance(&config.model.name, &config.model.params)?;
	let optimizer = registries
		.optimizers
		.get_instance(&config.optimizer.name, &config.optimizer.params)?;
	let criterion = registries
		.criteria
		.get_instance(&config.criterion.name, &config.criterion.params)?;

	let sampler = match &config.sampler {
		Some(spec) => registries.samplers.get_instance(&spec.name, &spec.params)?,
		None => registries
			.samplers
			.get_instance("sequential", &empty_params())?,
	};
	let scheduler = config
		.scheduler
		.as_ref()
		.map(|spec| registries.schedulers.get_instance(&spec.name, &spec.params))
		.transpose()?;
	let grad_clipper = config
		.grad_clipper
		.as_ref()
		.map(|spec| {
			registries
				.grad_clippers
				.get_instance(&spec.name, &spec.params)
		})
		.transpose()?;

	let transforms = config
		.transforms
		.iter()
		.map(|spec| registries.transforms.get_instance(&spec.name, &spec.params))
		.collect::<Result<Vec<_>, _>>()?;

	let mut callbacks = config
		.callbacks
		.iter()
		.map(|spec| registries.callbacks.get_instance(&spec.name, &spec.params))
		.collect::<Result<Vec<_>, _>>()?;
	callbacks.sort_by_key(|callback| callback.order());

	tracing::info!(
		"Assembled experiment '{}': model '{}', optimizer '{}', {} callback(s)",
		config.experiment.id,
		config.model.name,
		config.optimizer.name,
		callbacks.len()
	);

	Ok(TrainingAssembly {
		model,
		optimizer,
		criterion,
		sampler,
		scheduler,
		grad_clipper,
		transforms,
		callbacks,
	})
}

fn empty_params() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
