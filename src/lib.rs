//! # StackTune - Resource Planning for a Log-Analytics Stack
//!
//! StackTune sizes a single-host search engine, dashboard and log shipper
//! deployment to the machine it runs on, and evaluates runtime metrics
//! against thresholds appropriate to that machine.
//!
//! ## Features
//!
//! - **Tier Classification**: Eight memory tiers from 1 GB to beyond 64 GB
//! - **Parameter Planning**: Heap, container limits, queues and retention
//!   from memory tier, disk class and core count
//! - **Alert Thresholds**: Relaxed profile for small machines
//! - **Health Evaluation**: Stateless warning/critical alerts per sample
//! - **Artifact Emission**: Environment manifest written under a lock
//!
//! ## Quick Start
//!
//! ```no_run
//! use stacktune::plan::{classify, ParameterPlanner};
//! use stacktune::system::FactCollector;
//!
//! let facts = FactCollector::new("/var/lib").collect();
//! let tier = classify(&facts);
//! let params = ParameterPlanner::default().plan(&facts, tier).unwrap();
//!
//! println!("Search engine heap: {}", params.search.heap_size);
//! ```
//!
//! ## Health Evaluation
//!
//! ```no_run
//! use stacktune::monitor::{evaluate, resolve};
//! use stacktune::system::{FactCollector, MetricSampler, ServiceTarget};
//!
//! let facts = FactCollector::new("/").collect();
//! let thresholds = resolve(&facts);
//!
//! let sampler = MetricSampler::new("/", ServiceTarget::defaults());
//! let (snapshot, _unavailable) = sampler.sample();
//!
//! let evaluation = evaluate(&snapshot, &thresholds, 30);
//! evaluation.print_summary();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod emit;
pub mod error;
pub mod monitor;
pub mod plan;
pub mod system;

// Re-export commonly used types
pub use error::{Result, StackTuneError};
pub use monitor::{evaluate, resolve, AlertThresholds, Evaluation, MetricSnapshot};
pub use plan::{classify, HardwareFacts, ParameterPlanner, ParameterSet, Tier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use stacktune::prelude::*;
    //! ```

    pub use crate::emit::{EnvManifest, PlanLock};
    pub use crate::error::{Result, StackTuneError};
    pub use crate::monitor::{
        evaluate, resolve, Alert, AlertSeverity, AlertThresholds, Evaluation, MetricSnapshot,
        ServiceStatus,
    };
    pub use crate::plan::{
        classify, DiskType, HardwareFacts, ParameterPlanner, ParameterSet, PlannerPolicy, Tier,
    };
    pub use crate::system::{FactCollector, MetricSampler, ServiceProbe, ServiceTarget};
}
