//! Dl layer of the crucible training framework.
//!
//! Builds on `crucible-core` without the core layer knowing about it: this
//! crate obtains the core layer's [`ComponentRegistries`] bundle by
//! reference and registers its own deferred callback loader into the same
//! callbacks registry. Nothing from either layer's callback namespace is
//! materialized until a callback name is first resolved.

pub mod builder;
pub mod callbacks;
pub mod experiment;

pub use builder::{build_components, BuildError, TrainingAssembly};
pub use crucible_core::ComponentRegistries;
pub use experiment::{ConfigExperiment, Experiment};

/// Registers this layer's contributions into a bundle created by the core
/// layer.
///
/// Deferred like the core callback loader: loaders run in registration
/// order on first resolution, so core-layer names materialize before the
/// ones added here.
pub fn register_extras(registries: &ComponentRegistries) {
	registries.callbacks.late_add(|entries| {
		entries.add_from_module(callbacks::candidates())?;
		Ok(())
	});
}

/// Creates the fully wired bundle: built-ins plus this layer's extras.
pub fn registries_with_extras() -> Result<ComponentRegistries, crucible_registry::RegistryError> {
	let registries = ComponentRegistries::with_builtins()?;
	register_extras(&registries);
	Ok(registries)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn empty_params() -> toml::Value {
		toml::Value::Table(toml::map::Map::new())
	}

	#[test]
	fn both_layers_contribute_to_one_callbacks_registry() {
		let registries = registries_with_extras().unwrap();

		// Resolving a dl-layer name forces the core loader first, then this
		// layer's: both namespaces end up in the same registry instance.
		registries
			.callbacks
			.get_instance("metrics_logger", &empty_params())
			.unwrap();
		assert_eq!(
			registries.callbacks.all_keys().unwrap(),
			vec!["early_stopping", "lr_monitor", "metrics_logger", "timer"]
		);
	}

	#[test]
	fn dl_names_are_absent_without_register_extras() {
		let registries = ComponentRegistries::with_builtins().unwrap();
		let err = registries
			.callbacks
			.get_instance("metrics_logger", &empty_params())
			.unwrap_err();
		assert!(matches!(
			err,
			crucible_registry::RegistryError::NotFound { .. }
		));
	}

	#[test]
	fn builds_a_full_experiment_from_config() {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();

		let config: crucible_config::Config = r#"
[experiment]
id = "end-to-end"
num_epochs = 2

[model]
name = "mlp"
params = { in_features = 4, hidden = 8, out_features = 2 }

[optimizer]
name = "lookahead"
params = { k = 5, inner = { name = "adam", params = { lr = 0.001 } } }

[criterion]
name = "mse"

[sampler]
name = "shuffle"
params = { seed = 7 }

[scheduler]
name = "step"
params = { gamma = 0.5, step_size = 1 }

[grad_clipper]
name = "clip_norm"
params = { max_norm = 5.0 }

[[transforms]]
name = "normalize"
params = { mean = 0.5, std = 0.5 }

[[callbacks]]
name = "metrics_logger"
params = { log_on_batch_end = true, log_on_epoch_end = true }

[[callbacks]]
name = "early_stopping"
params = { metric = "loss", patience = 2 }
"#
		.parse()
		.unwrap();

		let registries = registries_with_extras().unwrap();
		let assembly = build_components(&registries, &config).unwrap();

		assert_eq!(assembly.model.num_parameters(), 4 * 8 + 8 + 8 * 2 + 2);
		assert_eq!(assembly.optimizer.lr(), 0.001);
		assert_eq!(assembly.transforms.len(), 1);
		assert!(assembly.scheduler.is_some());
		assert!(assembly.grad_clipper.is_some());
		// Logging-order callbacks sort before external ones.
		assert_eq!(assembly.callbacks.len(), 2);
		assert!(!assembly.callbacks[0].should_stop());
	}

	#[test]
	fn unknown_component_name_fails_the_build() {
		let config: crucible_config::Config = r#"
[experiment]
id = "broken"

[model]
name = "transformer"

[optimizer]
name = "sgd"
params = { lr = 0.1 }

[criterion]
name = "mse"
"#
		.parse()
		.unwrap();

		let registries = registries_with_extras().unwrap();
		let err = build_components(&registries, &config).unwrap_err();
		assert!(err
			.to_string()
			.starts_with("unknown model implementation 'transformer'"));
	}

	#[test]
	fn factory_errors_surface_with_original_message() {
		let config: crucible_config::Config = r#"
[experiment]
id = "bad-params"

[model]
name = "linear"
params = { in_features = 4, out_features = 2 }

[optimizer]
name = "sgd"

[criterion]
name = "mse"
"#
		.parse()
		.unwrap();

		let registries = registries_with_extras().unwrap();
		let err = build_components(&registries, &config).unwrap_err();
		assert_eq!(err.to_string(), "missing required parameter 'lr'");
	}
}
