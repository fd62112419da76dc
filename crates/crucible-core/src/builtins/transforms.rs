//! Built-in per-sample transforms.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedTransform, ComponentError, Transform, TransformFactory};
use crate::params;

/// Shifts and scales every feature: `(x - mean) / std`.
pub struct Normalize {
	mean: f64,
	std: f64,
}

impl Transform for Normalize {
	fn apply(&self, mut sample: Vec<f32>) -> Vec<f32> {
		for x in &mut sample {
			*x = ((*x as f64 - self.mean) / self.std) as f32;
		}
		sample
	}
}

impl FactorySource for Normalize {
	const NAME: &'static str = "normalize";
	type Component = BoxedTransform;

	fn factory() -> TransformFactory {
		create_normalize
	}
}

/// Factory function to create a normalize transform from configuration.
///
/// Configuration parameters:
/// - `mean`: defaults to 0.0
/// - `std` (required): must be non-zero
pub fn create_normalize(config: &toml::Value) -> Result<BoxedTransform, BoxError> {
	let mean = params::optional_f64(config, "mean", 0.0)?;
	let std = params::required_f64(config, "std")?;
	if std == 0.0 {
		return Err(ComponentError::InvalidParam {
			field: "std",
			message: "must be non-zero".to_string(),
		}
		.into());
	}
	Ok(Box::new(Normalize { mean, std }))
}

/// Multiplies every feature by a constant factor.
pub struct Scale {
	factor: f64,
}

impl Transform for Scale {
	fn apply(&self, mut sample: Vec<f32>) -> Vec<f32> {
		for x in &mut sample {
			*x = (*x as f64 * self.factor) as f32;
		}
		sample
	}
}

impl FactorySource for Scale {
	const NAME: &'static str = "scale";
	type Component = BoxedTransform;

	fn factory() -> TransformFactory {
		create_scale
	}
}

/// Factory function to create a scale transform from configuration.
///
/// Configuration parameters:
/// - `factor`: defaults to 1.0
pub fn create_scale(config: &toml::Value) -> Result<BoxedTransform, BoxError> {
	let factor = params::optional_f64(config, "factor", 1.0)?;
	Ok(Box::new(Scale { factor }))
}

/// All registrable transform implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, TransformFactory)> {
	vec![
		(Normalize::NAME, Normalize::factory()),
		(Scale::NAME, Scale::factory()),
	]
}
