//! Built-in gradient clippers.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedGradClipper, GradClipper, GradClipperFactory};
use crate::params;

/// Rescales the whole gradient vector when its L2 norm exceeds a bound.
pub struct ClipNorm {
	max_norm: f64,
}

impl GradClipper for ClipNorm {
	fn clip(&self, grads: &mut [f32]) {
		let norm = grads
			.iter()
			.map(|g| (*g as f64) * (*g as f64))
			.sum::<f64>()
			.sqrt();
		if norm > self.max_norm && norm > 0.0 {
			let scale = (self.max_norm / norm) as f32;
			for g in grads {
				*g *= scale;
			}
		}
	}
}

impl FactorySource for ClipNorm {
	const NAME: &'static str = "clip_norm";
	type Component = BoxedGradClipper;

	fn factory() -> GradClipperFactory {
		create_clip_norm
	}
}

/// Factory function to create a norm clipper from configuration.
///
/// Configuration parameters:
/// - `max_norm`: defaults to 1.0
pub fn create_clip_norm(config: &toml::Value) -> Result<BoxedGradClipper, BoxError> {
	let max_norm = params::optional_f64(config, "max_norm", 1.0)?;
	Ok(Box::new(ClipNorm { max_norm }))
}

/// Clamps every gradient component into `[-max_value, max_value]`.
pub struct ClipValue {
	max_value: f64,
}

impl GradClipper for ClipValue {
	fn clip(&self, grads: &mut [f32]) {
		let bound = self.max_value as f32;
		for g in grads {
			*g = g.clamp(-bound, bound);
		}
	}
}

impl FactorySource for ClipValue {
	const NAME: &'static str = "clip_value";
	type Component = BoxedGradClipper;

	fn factory() -> GradClipperFactory {
		create_clip_value
	}
}

/// Factory function to create a value clipper from configuration.
///
/// Configuration parameters:
/// - `max_value`: defaults to 1.0
pub fn create_clip_value(config: &toml::Value) -> Result<BoxedGradClipper, BoxError> {
	let max_value = params::optional_f64(config, "max_value", 1.0)?;
	Ok(Box::new(ClipValue { max_value }))
}

/// All registrable grad-clipper implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, GradClipperFactory)> {
	vec![
		(ClipNorm::NAME, ClipNorm::factory()),
		(ClipValue::NAME, ClipValue::factory()),
	]
}
