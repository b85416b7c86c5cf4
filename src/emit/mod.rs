//! Artifact emission
//!
//! Renders planned parameters for the stack's deployment files. Planning
//! itself never touches the filesystem; this module is the only writer.

mod lock;
mod manifest;

pub use lock::*;
pub use manifest::*;
