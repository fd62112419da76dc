//! Built-in optimizer implementations.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedOptimizer, ComponentError, Optimizer, OptimizerFactory};
use crate::params;

/// Stochastic gradient descent with optional momentum.
pub struct Sgd {
	lr: f64,
	momentum: f64,
	velocity: Vec<f32>,
}

impl Optimizer for Sgd {
	fn step(&mut self, parameters: &mut [f32], grads: &[f32]) {
		if self.velocity.len() != parameters.len() {
			self.velocity = vec![0.0; parameters.len()];
		}
		for ((p, g), v) in parameters
			.iter_mut()
			.zip(grads)
			.zip(self.velocity.iter_mut())
		{
			*v = (self.momentum as f32) * *v + g;
			*p -= (self.lr as f32) * *v;
		}
	}

	fn lr(&self) -> f64 {
		self.lr
	}

	fn set_lr(&mut self, lr: f64) {
		self.lr = lr;
	}
}

impl FactorySource for Sgd {
	const NAME: &'static str = "sgd";
	type Component = BoxedOptimizer;

	fn factory() -> OptimizerFactory {
		create_sgd
	}
}

/// Factory function to create an SGD optimizer from configuration.
///
/// Configuration parameters:
/// - `lr` (required): learning rate
/// - `momentum`: defaults to 0.0
pub fn create_sgd(config: &toml::Value) -> Result<BoxedOptimizer, BoxError> {
	let lr = params::required_f64(config, "lr")?;
	let momentum = params::optional_f64(config, "momentum", 0.0)?;
	Ok(Box::new(Sgd {
		lr,
		momentum,
		velocity: Vec::new(),
	}))
}

/// Adam with the usual bias-corrected first and second moments.
pub struct Adam {
	lr: f64,
	beta1: f64,
	beta2: f64,
	eps: f64,
	step_count: u64,
	first: Vec<f64>,
	second: Vec<f64>,
}

impl Optimizer for Adam {
	fn step(&mut self, parameters: &mut [f32], grads: &[f32]) {
		if self.first.len() != parameters.len() {
			self.first = vec![0.0; parameters.len()];
			self.second = vec![0.0; parameters.len()];
		}
		self.step_count += 1;
		let bias1 = 1.0 - self.beta1.powi(self.step_count as i32);
		let bias2 = 1.0 - self.beta2.powi(self.step_count as i32);
		for (i, (p, g)) in parameters.iter_mut().zip(grads).enumerate() {
			let g = *g as f64;
			self.first[i] = self.beta1 * self.first[i] + (1.0 - self.beta1) * g;
			self.second[i] = self.beta2 * self.second[i] + (1.0 - self.beta2) * g * g;
			let m_hat = self.first[i] / bias1;
			let v_hat = self.second[i] / bias2;
			*p -= (self.lr * m_hat / (v_hat.sqrt() + self.eps)) as f32;
		}
	}

	fn lr(&self) -> f64 {
		self.lr
	}

	fn set_lr(&mut self, lr: f64) {
		self.lr = lr;
	}
}

impl FactorySource for Adam {
	const NAME: &'static str = "adam";
	type Component = BoxedOptimizer;

	fn factory() -> OptimizerFactory {
		create_adam
	}
}

/// Factory function to create an Adam optimizer from configuration.
///
/// Configuration parameters:
/// - `lr` (required): learning rate
/// - `beta1`: defaults to 0.9
/// - `beta2`: defaults to 0.999
/// - `eps`: defaults to 1e-8
pub fn create_adam(config: &toml::Value) -> Result<BoxedOptimizer, BoxError> {
	let lr = params::required_f64(config, "lr")?;
	let beta1 = params::optional_f64(config, "beta1", 0.9)?;
	let beta2 = params::optional_f64(config, "beta2", 0.999)?;
	let eps = params::optional_f64(config, "eps", 1e-8)?;
	Ok(Box::new(Adam {
		lr,
		beta1,
		beta2,
		eps,
		step_count: 0,
		first: Vec::new(),
		second: Vec::new(),
	}))
}

/// Lookahead wrapper: runs an inner optimizer and every `k` steps pulls the
/// parameters toward a slow copy.
pub struct Lookahead {
	inner: BoxedOptimizer,
	k: usize,
	alpha: f64,
	step_count: usize,
	slow: Vec<f32>,
}

impl Lookahead {
	pub fn new(inner: BoxedOptimizer, k: usize, alpha: f64) -> Self {
		Self {
			inner,
			k,
			alpha,
			step_count: 0,
			slow: Vec::new(),
		}
	}
}

impl Optimizer for Lookahead {
	fn step(&mut self, parameters: &mut [f32], grads: &[f32]) {
		if self.slow.len() != parameters.len() {
			self.slow = parameters.to_vec();
		}
		self.inner.step(parameters, grads);
		self.step_count += 1;
		if self.step_count % self.k == 0 {
			for (slow, fast) in self.slow.iter_mut().zip(parameters.iter_mut()) {
				*slow += (self.alpha as f32) * (*fast - *slow);
				*fast = *slow;
			}
		}
	}

	fn lr(&self) -> f64 {
		self.inner.lr()
	}

	fn set_lr(&mut self, lr: f64) {
		self.inner.set_lr(lr);
	}
}

impl FactorySource for Lookahead {
	const NAME: &'static str = "lookahead";
	type Component = BoxedOptimizer;

	fn factory() -> OptimizerFactory {
		create_lookahead
	}
}

/// Factory function to create a Lookahead optimizer from configuration.
///
/// Configuration parameters:
/// - `inner` (required): table with `name` and optional `params` describing
///   the wrapped optimizer, resolved against the built-in candidates
/// - `k`: slow-update interval, defaults to 5
/// - `alpha`: slow-update interpolation, defaults to 0.5
pub fn create_lookahead(config: &toml::Value) -> Result<BoxedOptimizer, BoxError> {
	let k = params::optional_usize(config, "k", 5)?;
	let alpha = params::optional_f64(config, "alpha", 0.5)?;
	if k == 0 {
		return Err(ComponentError::InvalidParam {
			field: "k",
			message: "must be at least 1".to_string(),
		}
		.into());
	}

	let inner = config
		.get("inner")
		.ok_or(ComponentError::MissingParam("inner"))?;
	let name = inner
		.get("name")
		.and_then(toml::Value::as_str)
		.ok_or(ComponentError::MissingParam("inner.name"))?;
	if name == Lookahead::NAME {
		return Err(ComponentError::InvalidParam {
			field: "inner.name",
			message: "lookahead cannot wrap itself".to_string(),
		}
		.into());
	}

	let empty = toml::Value::Table(toml::map::Map::new());
	let inner_params = inner.get("params").unwrap_or(&empty);
	let factory = candidates()
		.into_iter()
		.find(|(candidate, _)| *candidate == name)
		.map(|(_, factory)| factory)
		.ok_or_else(|| ComponentError::InvalidParam {
			field: "inner.name",
			message: format!("unknown inner optimizer '{}'", name),
		})?;
	let inner_optimizer = factory(inner_params)?;
	Ok(Box::new(Lookahead::new(inner_optimizer, k, alpha)))
}

/// All registrable optimizer implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, OptimizerFactory)> {
	vec![
		(Sgd::NAME, Sgd::factory()),
		(Adam::NAME, Adam::factory()),
		(Lookahead::NAME, Lookahead::factory()),
	]
}
