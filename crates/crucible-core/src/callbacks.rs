//! Core-layer callbacks.
//!
//! These are loaded into the callbacks registry through the core layer's
//! deferred loader (see [`crate::registries`]), never eagerly: nothing here
//! is constructed until a callback name is first resolved.

use std::time::Instant;

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedCallback, Callback, CallbackFactory, CallbackOrder};
use crate::params;
use crate::state::RunState;

/// Stops a run when a monitored loader metric stops improving.
pub struct EarlyStopping {
	metric: String,
	patience: usize,
	min_delta: f64,
	minimize: bool,
	best: Option<f64>,
	stalled_epochs: usize,
	should_stop: bool,
}

impl EarlyStopping {
	pub fn new(metric: impl Into<String>, patience: usize, min_delta: f64, minimize: bool) -> Self {
		Self {
			metric: metric.into(),
			patience,
			min_delta,
			minimize,
			best: None,
			stalled_epochs: 0,
			should_stop: false,
		}
	}

	fn improved(&self, value: f64) -> bool {
		match self.best {
			None => true,
			Some(best) if self.minimize => value < best - self.min_delta,
			Some(best) => value > best + self.min_delta,
		}
	}
}

impl Callback for EarlyStopping {
	fn order(&self) -> CallbackOrder {
		CallbackOrder::External
	}

	fn on_loader_end(&mut self, state: &RunState) {
		let Some(value) = state.loader_metrics.get(&self.metric).copied() else {
			return;
		};
		if self.improved(value) {
			self.best = Some(value);
			self.stalled_epochs = 0;
		} else {
			self.stalled_epochs += 1;
			if self.stalled_epochs >= self.patience {
				tracing::info!(
					"Early stopping: no '{}' improvement for {} epochs",
					self.metric,
					self.stalled_epochs
				);
				self.should_stop = true;
			}
		}
	}

	fn should_stop(&self) -> bool {
		self.should_stop
	}
}

impl FactorySource for EarlyStopping {
	const NAME: &'static str = "early_stopping";
	type Component = BoxedCallback;

	fn factory() -> CallbackFactory {
		create_early_stopping
	}
}

/// Factory function to create an early-stopping callback from configuration.
///
/// Configuration parameters:
/// - `metric`: loader metric to monitor, defaults to "loss"
/// - `patience`: epochs without improvement before stopping, defaults to 5
/// - `min_delta`: change below which an epoch counts as stalled, defaults to 0.0
/// - `minimize`: whether lower is better, defaults to true
pub fn create_early_stopping(config: &toml::Value) -> Result<BoxedCallback, BoxError> {
	let metric = params::optional_string(config, "metric")?.unwrap_or_else(|| "loss".to_string());
	let patience = params::optional_usize(config, "patience", 5)?;
	let min_delta = params::optional_f64(config, "min_delta", 0.0)?;
	let minimize = params::optional_bool(config, "minimize", true)?;
	Ok(Box::new(EarlyStopping::new(
		metric, patience, min_delta, minimize,
	)))
}

/// Logs wall-clock timing for batches and loaders.
pub struct Timer {
	loader_started: Instant,
	batches: u64,
}

impl Timer {
	pub fn new() -> Self {
		Self {
			loader_started: Instant::now(),
			batches: 0,
		}
	}
}

impl Default for Timer {
	fn default() -> Self {
		Self::new()
	}
}

impl Callback for Timer {
	fn on_batch_end(&mut self, _state: &RunState) {
		self.batches += 1;
	}

	fn on_loader_end(&mut self, state: &RunState) {
		let elapsed = self.loader_started.elapsed();
		tracing::debug!(
			"Loader '{}' finished: {} batches in {:.3}s",
			state.loader_name,
			self.batches,
			elapsed.as_secs_f64()
		);
		self.loader_started = Instant::now();
		self.batches = 0;
	}
}

impl FactorySource for Timer {
	const NAME: &'static str = "timer";
	type Component = BoxedCallback;

	fn factory() -> CallbackFactory {
		create_timer
	}
}

pub fn create_timer(_config: &toml::Value) -> Result<BoxedCallback, BoxError> {
	Ok(Box::new(Timer::new()))
}

/// All core-layer callback implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, CallbackFactory)> {
	vec![
		(EarlyStopping::NAME, EarlyStopping::factory()),
		(Timer::NAME, Timer::factory()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn early_stopping_fires_after_patience_epochs() {
		let mut callback = EarlyStopping::new("loss", 2, 0.0, true);
		let mut state = RunState::new("valid");

		for loss in [1.0, 0.5, 0.6, 0.7] {
			state.record_loader_metric("loss", loss);
			callback.on_loader_end(&state);
		}
		assert!(callback.should_stop());
	}

	#[test]
	fn early_stopping_resets_on_improvement() {
		let mut callback = EarlyStopping::new("loss", 2, 0.0, true);
		let mut state = RunState::new("valid");

		for loss in [1.0, 1.1, 0.9, 1.0, 0.8] {
			state.record_loader_metric("loss", loss);
			callback.on_loader_end(&state);
		}
		assert!(!callback.should_stop());
	}

	#[test]
	fn early_stopping_ignores_missing_metric() {
		let mut callback = EarlyStopping::new("accuracy", 1, 0.0, false);
		let state = RunState::new("valid");
		callback.on_loader_end(&state);
		callback.on_loader_end(&state);
		assert!(!callback.should_stop());
	}
}
