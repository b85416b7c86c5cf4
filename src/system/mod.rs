//! Host adapters
//!
//! Collects hardware facts for planning and samples runtime metrics for
//! alert evaluation.

mod resources;
mod sampler;

pub use resources::*;
pub use sampler::*;
