//! Built-in loss criteria.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedCriterion, Criterion, CriterionFactory};

/// Mean squared error.
pub struct MseLoss;

impl Criterion for MseLoss {
	fn loss(&self, predictions: &[f32], targets: &[f32]) -> f64 {
		let n = predictions.len().min(targets.len()).max(1);
		predictions
			.iter()
			.zip(targets)
			.map(|(p, t)| {
				let d = (p - t) as f64;
				d * d
			})
			.sum::<f64>()
			/ n as f64
	}
}

impl FactorySource for MseLoss {
	const NAME: &'static str = "mse";
	type Component = BoxedCriterion;

	fn factory() -> CriterionFactory {
		create_mse
	}
}

pub fn create_mse(_config: &toml::Value) -> Result<BoxedCriterion, BoxError> {
	Ok(Box::new(MseLoss))
}

/// Mean absolute error.
pub struct MaeLoss;

impl Criterion for MaeLoss {
	fn loss(&self, predictions: &[f32], targets: &[f32]) -> f64 {
		let n = predictions.len().min(targets.len()).max(1);
		predictions
			.iter()
			.zip(targets)
			.map(|(p, t)| (p - t).abs() as f64)
			.sum::<f64>()
			/ n as f64
	}
}

impl FactorySource for MaeLoss {
	const NAME: &'static str = "mae";
	type Component = BoxedCriterion;

	fn factory() -> CriterionFactory {
		create_mae
	}
}

pub fn create_mae(_config: &toml::Value) -> Result<BoxedCriterion, BoxError> {
	Ok(Box::new(MaeLoss))
}

/// All registrable criterion implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, CriterionFactory)> {
	vec![
		(MseLoss::NAME, MseLoss::factory()),
		(MaeLoss::NAME, MaeLoss::factory()),
	]
}
