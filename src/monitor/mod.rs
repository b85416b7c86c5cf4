//! Health monitoring
//!
//! Resolves tier-relative alert thresholds and evaluates metric snapshots
//! against them.

mod alerts;
mod snapshot;
mod thresholds;

pub use alerts::*;
pub use snapshot::*;
pub use thresholds::*;
