//! Run state shared with callbacks.

use std::collections::HashMap;

/// Snapshot of a training run that callbacks observe at batch and loader
/// boundaries.
///
/// `batch_metrics` holds the values produced by the most recent batch,
/// `loader_metrics` the aggregates for the loader that just finished.
#[derive(Debug, Default, Clone)]
pub struct RunState {
	/// Name of the active loader, e.g. "train" or "valid".
	pub loader_name: String,
	/// Batches processed since the start of the run.
	pub global_step: u64,
	/// Completed epochs since the start of the run.
	pub global_epoch: u64,
	/// Metrics from the most recent batch.
	pub batch_metrics: HashMap<String, f64>,
	/// Aggregated metrics for the loader that just finished.
	pub loader_metrics: HashMap<String, f64>,
}

impl RunState {
	pub fn new(loader_name: impl Into<String>) -> Self {
		Self {
			loader_name: loader_name.into(),
			..Self::default()
		}
	}

	/// Records a batch metric, overwriting any previous value for the name.
	pub fn record_batch_metric(&mut self, name: impl Into<String>, value: f64) {
		self.batch_metrics.insert(name.into(), value);
	}

	/// Records a loader-level metric.
	pub fn record_loader_metric(&mut self, name: impl Into<String>, value: f64) {
		self.loader_metrics.insert(name.into(), value);
	}
}
