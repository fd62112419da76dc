//! Core layer of the crucible training framework.
//!
//! Defines the component traits for every pluggable domain, the
//! [`ComponentRegistries`] bundle that maps configuration names to factories
//! for each of them, the built-in implementations, and the core callbacks.
//! Higher layers receive a reference to the same bundle and extend it,
//! callback loaders in particular are deferred, so a layer on top of this
//! one can contribute entries without this crate ever importing it.

pub mod builtins;
pub mod callbacks;
pub mod components;
pub mod params;
pub mod registries;
pub mod state;

pub use components::{
	BoxedCallback, BoxedCriterion, BoxedGradClipper, BoxedModel, BoxedOptimizer, BoxedSampler,
	BoxedScheduler, BoxedTransform, Callback, CallbackFactory, CallbackOrder, ComponentError,
	Criterion, CriterionFactory, GradClipper, GradClipperFactory, Model, ModelFactory, Optimizer,
	OptimizerFactory, Sampler, SamplerFactory, Scheduler, SchedulerFactory, Transform,
	TransformFactory,
};
pub use registries::ComponentRegistries;
pub use state::RunState;
