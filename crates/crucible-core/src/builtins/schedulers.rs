//! Built-in learning-rate schedulers.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedScheduler, Scheduler, SchedulerFactory};
use crate::params;

/// Keeps the base learning rate unchanged.
pub struct ConstantLr;

impl Scheduler for ConstantLr {
	fn lr_at(&self, base_lr: f64, _epoch: u64) -> f64 {
		base_lr
	}
}

impl FactorySource for ConstantLr {
	const NAME: &'static str = "constant";
	type Component = BoxedScheduler;

	fn factory() -> SchedulerFactory {
		create_constant
	}
}

pub fn create_constant(_config: &toml::Value) -> Result<BoxedScheduler, BoxError> {
	Ok(Box::new(ConstantLr))
}

/// Multiplies the learning rate by `gamma` every `step_size` epochs.
pub struct StepLr {
	gamma: f64,
	step_size: u64,
}

impl Scheduler for StepLr {
	fn lr_at(&self, base_lr: f64, epoch: u64) -> f64 {
		base_lr * self.gamma.powi((epoch / self.step_size) as i32)
	}
}

impl FactorySource for StepLr {
	const NAME: &'static str = "step";
	type Component = BoxedScheduler;

	fn factory() -> SchedulerFactory {
		create_step
	}
}

/// Factory function to create a step scheduler from configuration.
///
/// Configuration parameters:
/// - `gamma`: decay factor, defaults to 0.1
/// - `step_size`: epochs between decays, defaults to 10
pub fn create_step(config: &toml::Value) -> Result<BoxedScheduler, BoxError> {
	let gamma = params::optional_f64(config, "gamma", 0.1)?;
	let step_size = params::optional_usize(config, "step_size", 10)?.max(1) as u64;
	Ok(Box::new(StepLr { gamma, step_size }))
}

/// All registrable scheduler implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, SchedulerFactory)> {
	vec![
		(ConstantLr::NAME, ConstantLr::factory()),
		(StepLr::NAME, StepLr::factory()),
	]
}
