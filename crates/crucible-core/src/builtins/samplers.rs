//! Built-in dataset samplers.

use crucible_registry::{BoxError, FactorySource};

use crate::components::{BoxedSampler, Sampler, SamplerFactory};
use crate::params;

/// Visits samples in dataset order.
pub struct SequentialSampler;

impl Sampler for SequentialSampler {
	fn order(&self, len: usize) -> Vec<usize> {
		(0..len).collect()
	}
}

impl FactorySource for SequentialSampler {
	const NAME: &'static str = "sequential";
	type Component = BoxedSampler;

	fn factory() -> SamplerFactory {
		create_sequential
	}
}

pub fn create_sequential(_config: &toml::Value) -> Result<BoxedSampler, BoxError> {
	Ok(Box::new(SequentialSampler))
}

/// Seeded pseudo-random permutation of the dataset.
///
/// Uses an xorshift generator so the permutation is reproducible from the
/// seed alone.
pub struct ShuffleSampler {
	seed: u64,
}

impl Sampler for ShuffleSampler {
	fn order(&self, len: usize) -> Vec<usize> {
		let mut order: Vec<usize> = (0..len).collect();
		let mut state = self.seed | 1;
		for i in (1..len).rev() {
			state ^= state << 13;
			state ^= state >> 7;
			state ^= state << 17;
			order.swap(i, (state % (i as u64 + 1)) as usize);
		}
		order
	}
}

impl FactorySource for ShuffleSampler {
	const NAME: &'static str = "shuffle";
	type Component = BoxedSampler;

	fn factory() -> SamplerFactory {
		create_shuffle
	}
}

/// Factory function to create a shuffle sampler from configuration.
///
/// Configuration parameters:
/// - `seed`: permutation seed, defaults to 42
pub fn create_shuffle(config: &toml::Value) -> Result<BoxedSampler, BoxError> {
	let seed = params::optional_usize(config, "seed", 42)? as u64;
	Ok(Box::new(ShuffleSampler { seed }))
}

/// All registrable sampler implementations, in registration order.
pub fn candidates() -> Vec<(&'static str, SamplerFactory)> {
	vec![
		(SequentialSampler::NAME, SequentialSampler::factory()),
		(ShuffleSampler::NAME, ShuffleSampler::factory()),
	]
}
