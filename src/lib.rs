#![forbid(unsafe_code)]
//! thetapart: partition a theta-join matrix into at most `P` groups with a
//! bounded per-group cost.
//!
//! This crate only re-exports the workspace members; integration tests and
//! benches live next to it.

pub use thetapart_core::prelude;
pub use thetapart_exec as exec;
pub use thetapart_io as io;
pub use thetapart_search as search;
