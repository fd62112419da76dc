//! Dl-layer callbacks.
//!
//! Registered into the shared callbacks registry through this layer's
//! deferred loader (see [`crate::register_extras`]); the core layer never
//! imports this module.

use std::collections::HashMap;

use crucible_core::components::{BoxedCallback, Callback, CallbackFactory, CallbackOrder};
use crucible_core::params;
use crucible_core::state::RunState;
use crucible_core::ComponentError;
use crucible_registry::{BoxError, FactorySource};

/// Emits run metrics as structured log lines.
///
/// Metric names follow the `{name}/{mode}{suffix}` convention. The suffixes
/// are empty when exactly one of the two log points is enabled; when both
/// are, batch metrics get `_batch` and loader metrics `_epoch` so the two
/// series stay distinguishable. The suffix choice only affects metric-name
/// disambiguation when both flags are set; single-point configurations log
/// plain names.
#[derive(Debug)]
pub struct MetricsLogger {
	metric_names: Option<Vec<String>>,
	log_on_batch_end: bool,
	log_on_epoch_end: bool,
	batch_suffix: &'static str,
	epoch_suffix: &'static str,
}

impl MetricsLogger {
	/// Creates a logger; fails when both log points are disabled.
	pub fn new(
		metric_names: Option<Vec<String>>,
		log_on_batch_end: bool,
		log_on_epoch_end: bool,
	) -> Result<Self, ComponentError> {
		if !log_on_batch_end && !log_on_epoch_end {
			return Err(ComponentError::InvalidParam {
				field: "log_on_batch_end",
				message: "at least one of log_on_batch_end / log_on_epoch_end must be set"
					.to_string(),
			});
		}
		let (batch_suffix, epoch_suffix) = if log_on_batch_end && log_on_epoch_end {
			("_batch", "_epoch")
		} else {
			("", "")
		};
		Ok(Self {
			metric_names,
			log_on_batch_end,
			log_on_epoch_end,
			batch_suffix,
			epoch_suffix,
		})
	}

	/// Selects and formats the metric lines for one log point.
	fn render(
		&self,
		metrics: &HashMap<String, f64>,
		step: u64,
		mode: &str,
		suffix: &str,
	) -> Vec<String> {
		let names: Vec<&str> = match &self.metric_names {
			Some(names) => names.iter().map(String::as_str).collect(),
			None => {
				let mut all: Vec<&str> = metrics.keys().map(String::as_str).collect();
				all.sort_unstable();
				all
			}
		};
		names
			.into_iter()
			.filter_map(|name| {
				metrics
					.get(name)
					.map(|value| format!("{}/{}{} = {} (step {})", name, mode, suffix, value, step))
			})
			.collect()
	}

	fn log(&self, metrics: &HashMap<String, f64>, step: u64, mode: &str, suffix: &str) {
		for line in self.render(metrics, step, mode, suffix) {
			tracing::info!(target: "crucible::metrics", "{}", line);
		}
	}
}

impl Callback for MetricsLogger {
	fn order(&self) -> CallbackOrder {
		CallbackOrder::Logging
	}

	fn on_batch_end(&mut self, state: &RunState) {
		if self.log_on_batch_end {
			self.log(
				&state.batch_metrics,
				state.global_step,
				&state.loader_name,
				self.batch_suffix,
			);
		}
	}

	fn on_loader_end(&mut self, state: &RunState) {
		if self.log_on_epoch_end {
			self.log(
				&state.loader_metrics,
				state.global_epoch,
				&state.loader_name,
				self.epoch_suffix,
			);
		}
	}
}

impl FactorySource for MetricsLogger {
	const NAME: &'static str = "metrics_logger";
	type Component = BoxedCallback;

	fn factory() -> CallbackFactory {
		create_metrics_logger
	}
}

/// Factory function to create a metrics logger from configuration.
///
/// Configuration parameters:
/// - `metric_names`: list of metric names to log; logs everything if absent
/// - `log_on_batch_end`: log per-batch metrics, defaults to true
/// - `log_on_epoch_end`: log per-epoch metrics, defaults to true
pub fn create_metrics_logger(config: &toml::Value) -> Result<BoxedCallback, BoxError> {
	let metric_names = params::optional_string_list(config, "metric_names")?;
	let log_on_batch_end = params::optional_bool(config, "log_on_batch_end", true)?;
	let log_on_epoch_end = params::optional_bool(config, "log_on_epoch_end", true)?;
	let logger = MetricsLogger::new(metric_names, log_on_batch_end, log_on_epoch_end)?;
	Ok(Box::new(logger))
}

/// Logs the effective learning rate at every loader end.
pub struct LrMonitor;

impl Callback for LrMonitor {
	fn order(&self) -> CallbackOrder {
		CallbackOrder::Logging
	}

	fn on_loader_end(&mut self, state: &RunState) {
		if let Some(lr) = state.loader_metrics.get("lr") {
			tracing::info!(
				target: "crucible::metrics",
				"lr/{} = {} (epoch {})",
				state.loader_name,
				lr,
				state.global_epoch
			);
		}
	}
}

impl FactorySource for LrMonitor {
	const NAME: &'static str = "lr_monitor";
	type Component = BoxedCallback;

	fn factory() -> CallbackFactory {
		create_lr_monitor
	}
}

pub fn create_lr_monitor(_config: &toml::Value) -> Result<BoxedCallback, BoxError> {
	Ok(Box::new(LrMonitor))
}

/// All dl-layer callback implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, CallbackFactory)> {
	vec![
		(MetricsLogger::NAME, MetricsLogger::factory()),
		(LrMonitor::NAME, LrMonitor::factory()),
	]
}
