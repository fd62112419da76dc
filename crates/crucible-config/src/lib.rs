//! Configuration module for the crucible training framework.
//!
//! An experiment configuration names one pluggable component per domain and
//! carries the keyword arguments for each as a raw TOML table. Resolution of
//! those names into concrete components happens elsewhere, against the
//! component registries; this crate only parses and validates the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Reference to one pluggable component: a registry name plus the keyword
/// arguments its factory receives, kept as a raw TOML table because each
/// implementation has its own parameter format.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentSpec {
	/// Registry name of the implementation to construct.
	pub name: String,
	/// Parameters forwarded to the factory. Defaults to an empty table.
	#[serde(default = "empty_table")]
	pub params: toml::Value,
}

impl ComponentSpec {
	/// Creates a spec with no parameters.
	pub fn bare(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			params: empty_table(),
		}
	}
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}

/// Configuration specific to the experiment instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentConfig {
	/// Unique identifier for this experiment.
	pub id: String,
	/// Number of epochs to run. Defaults to 1 if not specified.
	#[serde(default = "default_num_epochs")]
	pub num_epochs: u64,
}

fn default_num_epochs() -> u64 {
	1
}

/// Main configuration structure for a training experiment.
///
/// One component reference per singular domain, optional references for the
/// domains a run can do without, and lists where several components compose
/// (transforms are applied in order, callbacks run side by side).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to the experiment instance.
	pub experiment: ExperimentConfig,
	/// Which model implementation to construct.
	pub model: ComponentSpec,
	/// Which optimizer implementation to construct.
	pub optimizer: ComponentSpec,
	/// Which criterion implementation to construct.
	pub criterion: ComponentSpec,
	/// Which sampler to use. Defaults to sequential order when absent.
	pub sampler: Option<ComponentSpec>,
	/// Optional learning-rate scheduler.
	pub scheduler: Option<ComponentSpec>,
	/// Optional gradient clipper.
	pub grad_clipper: Option<ComponentSpec>,
	/// Data transforms, applied in the order listed.
	#[serde(default)]
	pub transforms: Vec<ComponentSpec>,
	/// Callbacks attached to the run.
	#[serde(default)]
	pub callbacks: Vec<ComponentSpec>,
}

impl Config {
	/// Loads and validates a configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Validates semantic constraints that the type structure cannot
	/// express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (section, spec) in self.component_specs() {
			if spec.name.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"{} component name must not be empty",
					section
				)));
			}
		}
		if self.experiment.num_epochs == 0 {
			return Err(ConfigError::Validation(
				"experiment.num_epochs must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	fn component_specs(&self) -> Vec<(&'static str, &ComponentSpec)> {
		let mut specs = vec![
			("model", &self.model),
			("optimizer", &self.optimizer),
			("criterion", &self.criterion),
		];
		if let Some(sampler) = &self.sampler {
			specs.push(("sampler", sampler));
		}
		if let Some(scheduler) = &self.scheduler {
			specs.push(("scheduler", scheduler));
		}
		if let Some(clipper) = &self.grad_clipper {
			specs.push(("grad_clipper", clipper));
		}
		for transform in &self.transforms {
			specs.push(("transform", transform));
		}
		for callback in &self.callbacks {
			specs.push(("callback", callback));
		}
		specs
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let config: Config = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const FULL_CONFIG: &str = r#"
[experiment]
id = "mnist-baseline"
num_epochs = 3

[model]
name = "mlp"
params = { in_features = 784, hidden = 128, out_features = 10 }

[optimizer]
name = "sgd"
params = { lr = 0.01 }

[criterion]
name = "mse"

[scheduler]
name = "step"
params = { gamma = 0.5, step_size = 2 }

[[transforms]]
name = "normalize"
params = { mean = 0.5, std = 0.25 }

[[callbacks]]
name = "metrics_logger"
params = { log_on_batch_end = true, log_on_epoch_end = true }
"#;

	#[test]
	fn parses_full_config() {
		let config: Config = FULL_CONFIG.parse().unwrap();
		assert_eq!(config.experiment.id, "mnist-baseline");
		assert_eq!(config.experiment.num_epochs, 3);
		assert_eq!(config.model.name, "mlp");
		assert_eq!(config.optimizer.name, "sgd");
		assert!(config.sampler.is_none());
		assert_eq!(config.transforms.len(), 1);
		assert_eq!(config.callbacks.len(), 1);

		let lr = config
			.optimizer
			.params
			.get("lr")
			.and_then(toml::Value::as_float)
			.unwrap();
		assert_eq!(lr, 0.01);
	}

	#[test]
	fn params_default_to_empty_table() {
		let config: Config = FULL_CONFIG.parse().unwrap();
		assert!(config
			.criterion
			.params
			.as_table()
			.is_some_and(|t| t.is_empty()));
	}

	#[test]
	fn num_epochs_defaults_to_one() {
		let trimmed = FULL_CONFIG.replace("num_epochs = 3\n", "");
		let config: Config = trimmed.parse().unwrap();
		assert_eq!(config.experiment.num_epochs, 1);
	}

	#[test]
	fn missing_section_is_a_parse_error() {
		let err = "[experiment]\nid = \"x\"\n".parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[test]
	fn empty_component_name_fails_validation() {
		let broken = FULL_CONFIG.replace("name = \"sgd\"", "name = \"\"");
		let err = broken.parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
		assert!(err.to_string().contains("optimizer"));
	}

	#[test]
	fn zero_epochs_fails_validation() {
		let broken = FULL_CONFIG.replace("num_epochs = 3", "num_epochs = 0");
		let err = broken.parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn loads_from_file() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("experiment.toml");
		fs::write(&config_path, FULL_CONFIG).unwrap();

		let config = Config::from_file(&config_path).unwrap();
		assert_eq!(config.experiment.id, "mnist-baseline");
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let err = Config::from_file("/nonexistent/experiment.toml").unwrap_err();
		assert!(matches!(err, ConfigError::Io(_)));
	}
}
