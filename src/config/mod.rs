//! Configuration module for StackTune
//!
//! Provides the CLI arguments and the validated run configuration.

mod settings;

pub use settings::*;
