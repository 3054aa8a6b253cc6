//! Deterministic synthetic customer geography.
//!
//! `GeoEngine` turns a date into a distribution over provinces and draws
//! reproducible assignments from it. The calendar, age and growth-curve
//! modules are the supporting generators of the same simulation.

pub mod ages;
pub mod anchor;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod geography;
pub mod growth_curve;
pub mod growth_ramp;
pub mod normalize;
pub mod region_mix;
pub mod request;
pub mod rng;
pub mod sampler;
pub mod store_effects;
pub mod subregion_mix;
pub mod summary;
pub mod types;

pub use engine::{GeoEngine, WeightBreakdown};
pub use error::{GeoError, GeoResult};
pub use request::{AssignCall, AssignRequest, PeriodInput};
pub use sampler::Assignment;
