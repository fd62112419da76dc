//! Built-in model implementations.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedModel, Model, ModelFactory};
use crate::params;

/// A single fully connected layer with deterministic initialization.
pub struct Linear {
	in_features: usize,
	out_features: usize,
	weights: Vec<f32>,
	bias: Vec<f32>,
}

impl Linear {
	pub fn new(in_features: usize, out_features: usize) -> Self {
		// Deterministic near-zero initialization keeps runs reproducible
		// without a randomness dependency.
		let weights = (0..in_features * out_features)
			.map(|i| ((i % 7) as f32 - 3.0) * 0.01)
			.collect();
		Self {
			in_features,
			out_features,
			weights,
			bias: vec![0.0; out_features],
		}
	}
}

impl Model for Linear {
	fn forward(&self, input: &[f32]) -> Vec<f32> {
		let mut output = self.bias.clone();
		for (i, x) in input.iter().take(self.in_features).enumerate() {
			for j in 0..self.out_features {
				output[j] += x * self.weights[i * self.out_features + j];
			}
		}
		output
	}

	fn num_parameters(&self) -> usize {
		self.weights.len() + self.bias.len()
	}
}

impl FactorySource for Linear {
	const NAME: &'static str = "linear";
	type Component = BoxedModel;

	fn factory() -> ModelFactory {
		create_linear
	}
}

/// Factory function to create a linear model from configuration.
///
/// Configuration parameters:
/// - `in_features` (required): input dimension
/// - `out_features` (required): output dimension
pub fn create_linear(config: &toml::Value) -> Result<BoxedModel, BoxError> {
	let in_features = params::required_usize(config, "in_features")?;
	let out_features = params::required_usize(config, "out_features")?;
	Ok(Box::new(Linear::new(in_features, out_features)))
}

/// Two linear layers with a ReLU in between.
pub struct Mlp {
	hidden: Linear,
	output: Linear,
}

impl Model for Mlp {
	fn forward(&self, input: &[f32]) -> Vec<f32> {
		let mut activations = self.hidden.forward(input);
		for a in &mut activations {
			*a = a.max(0.0);
		}
		self.output.forward(&activations)
	}

	fn num_parameters(&self) -> usize {
		self.hidden.num_parameters() + self.output.num_parameters()
	}
}

impl FactorySource for Mlp {
	const NAME: &'static str = "mlp";
	type Component = BoxedModel;

	fn factory() -> ModelFactory {
		create_mlp
	}
}

/// Factory function to create an MLP from configuration.
///
/// Configuration parameters:
/// - `in_features` (required): input dimension
/// - `out_features` (required): output dimension
/// - `hidden`: hidden layer width, defaults to 64
pub fn create_mlp(config: &toml::Value) -> Result<BoxedModel, BoxError> {
	let in_features = params::required_usize(config, "in_features")?;
	let out_features = params::required_usize(config, "out_features")?;
	let hidden = params::optional_usize(config, "hidden", 64)?;
	Ok(Box::new(Mlp {
		hidden: Linear::new(in_features, hidden),
		output: Linear::new(hidden, out_features),
	}))
}

/// All registrable model implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, ModelFactory)> {
	vec![
		(Linear::NAME, Linear::factory()),
		(Mlp::NAME, Mlp::factory()),
	]
}
