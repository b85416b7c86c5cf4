//! Configuration planning
//!
//! Classifies a machine into a memory tier and derives the tuned
//! parameters for every managed subsystem from it.

mod facts;
mod params;
mod planner;
mod tier;

pub use facts::*;
pub use params::*;
pub use planner::*;
pub use tier::*;
