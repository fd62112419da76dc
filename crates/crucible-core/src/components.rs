//! Component traits for the pluggable training domains.
//!
//! The registry treats every component as an opaque constructible: the
//! traits here are the minimal surface the framework needs to drive a run.
//! Each domain gets a boxed alias and a factory alias so registries,
//! configuration and builders all speak the same types.

use crucible_registry::Factory;
use thiserror::Error;

use crate::state::RunState;

/// Errors raised by built-in component factories during construction.
///
/// These cross the registry boundary boxed and must survive a downcast, so
/// callers can tell a bad parameter from a missing one.
#[derive(Debug, Error)]
pub enum ComponentError {
	/// A required factory parameter was absent from the TOML table.
	#[error("missing required parameter '{0}'")]
	MissingParam(&'static str),
	/// A parameter was present but unusable.
	#[error("invalid value for parameter '{field}': {message}")]
	InvalidParam {
		field: &'static str,
		message: String,
	},
}

/// A trainable model: maps an input feature vector to an output vector.
pub trait Model: Send + Sync {
	fn forward(&self, input: &[f32]) -> Vec<f32>;
	/// Total number of trainable parameters.
	fn num_parameters(&self) -> usize;
}

/// Parameter-update rule applied after each backward pass.
pub trait Optimizer: Send + Sync {
	/// Applies one update step to `params` given `grads`.
	fn step(&mut self, params: &mut [f32], grads: &[f32]);
	fn lr(&self) -> f64;
	fn set_lr(&mut self, lr: f64);
}

/// Learning-rate schedule over epochs.
pub trait Scheduler: Send + Sync {
	/// Learning rate for the given epoch, derived from the base rate.
	fn lr_at(&self, base_lr: f64, epoch: u64) -> f64;
}

/// Loss function over predictions and targets.
pub trait Criterion: Send + Sync {
	fn loss(&self, predictions: &[f32], targets: &[f32]) -> f64;
}

/// Produces the order in which samples of a dataset are visited.
pub trait Sampler: Send + Sync {
	fn order(&self, len: usize) -> Vec<usize>;
}

/// Per-sample data transform.
pub trait Transform: Send + Sync {
	fn apply(&self, sample: Vec<f32>) -> Vec<f32>;
}

/// Gradient post-processing applied before the optimizer step.
pub trait GradClipper: Send + Sync {
	fn clip(&self, grads: &mut [f32]);
}

/// Execution order for callbacks within one event.
///
/// Lower values run first, so metric producers run before loggers and
/// externally contributed callbacks run last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallbackOrder {
	Internal = 0,
	Metric = 20,
	Optimizer = 40,
	Scheduler = 60,
	Logging = 80,
	External = 100,
}

/// Hook into the training loop's batch and loader boundaries.
pub trait Callback: Send {
	/// Where this callback sorts among the callbacks attached to a run.
	fn order(&self) -> CallbackOrder {
		CallbackOrder::Internal
	}

	/// Called after every batch.
	fn on_batch_end(&mut self, _state: &RunState) {}

	/// Called after a loader (one pass over a data split) finishes.
	fn on_loader_end(&mut self, _state: &RunState) {}

	/// Polled by the training loop after each loader; a callback returning
	/// true requests the run to end early.
	fn should_stop(&self) -> bool {
		false
	}
}

macro_rules! impl_debug_for_dyn {
	($($trait:ident),* $(,)?) => {
		$(
			impl std::fmt::Debug for dyn $trait {
				fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
					f.write_str(concat!("dyn ", stringify!($trait)))
				}
			}
		)*
	};
}

impl_debug_for_dyn!(Model, Optimizer, Scheduler, Criterion, Sampler, Transform, GradClipper, Callback);

pub type BoxedModel = Box<dyn Model>;
pub type BoxedOptimizer = Box<dyn Optimizer>;
pub type BoxedScheduler = Box<dyn Scheduler>;
pub type BoxedCriterion = Box<dyn Criterion>;
pub type BoxedSampler = Box<dyn Sampler>;
pub type BoxedTransform = Box<dyn Transform>;
pub type BoxedGradClipper = Box<dyn GradClipper>;
pub type BoxedCallback = Box<dyn Callback>;

pub type ModelFactory = Factory<BoxedModel>;
pub type OptimizerFactory = Factory<BoxedOptimizer>;
pub type SchedulerFactory = Factory<BoxedScheduler>;
pub type CriterionFactory = Factory<BoxedCriterion>;
pub type SamplerFactory = Factory<BoxedSampler>;
pub type TransformFactory = Factory<BoxedTransform>;
pub type GradClipperFactory = Factory<BoxedGradClipper>;
pub type CallbackFactory = Factory<BoxedCallback>;
