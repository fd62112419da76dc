//! Experiment abstraction over staged component selection.

use crucible_config::{ComponentSpec, Config};

/// Describes which components a run uses, per stage.
///
/// A stage is one phase of a run ("pretrain", "finetune", ...); most
/// experiments have a single `train` stage. Implementations only hand out
/// component specs; resolution against the registries happens in the
/// builder, so an experiment never constructs anything itself.
pub trait Experiment {
	/// Stage names, in execution order.
	fn stages(&self) -> Vec<String>;

	/// Model spec for the given stage.
	fn model(&self, stage: &str) -> ComponentSpec;

	/// Optimizer spec for the given stage.
	fn optimizer(&self, stage: &str) -> ComponentSpec;

	/// Criterion spec for the given stage.
	fn criterion(&self, stage: &str) -> ComponentSpec;

	/// Callback specs for the given stage.
	fn callbacks(&self, stage: &str) -> Vec<ComponentSpec>;
}

/// Single-stage experiment backed by a parsed [`Config`].
pub struct ConfigExperiment {
	config: Config,
}

impl ConfigExperiment {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}
}

impl Experiment for ConfigExperiment {
	fn stages(&self) -> Vec<String> {
		vec!["train".to_string()]
	}

	fn model(&self, _stage: &str) -> ComponentSpec {
		self.config.model.clone()
	}

	fn optimizer(&self, _stage: &str) -> ComponentSpec {
		self.config.optimizer.clone()
	}

	fn criterion(&self, _stage: &str) -> ComponentSpec {
		self.config.criterion.clone()
	}

	fn callbacks(&self, _stage: &str) -> Vec<ComponentSpec> {
		self.config.callbacks.clone()
	}
}
