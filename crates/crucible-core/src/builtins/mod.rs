//! Built-in implementations for every component domain.
//!
//! Each module exports its concrete types plus a `candidates()` list of
//! `(name, factory)` pairs, the explicit registration source the registries
//! are populated from. Abstract traits never appear in a candidate list, so
//! bulk registration has nothing to skip.

pub mod clippers;
pub mod criteria;
pub mod models;
pub mod optimizers;
pub mod samplers;
pub mod schedulers;
pub mod transforms;
