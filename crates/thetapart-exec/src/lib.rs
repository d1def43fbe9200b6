#![forbid(unsafe_code)]
//! thetapart-exec: runs a partitioning job end to end.
//!
//! A job names a policy (rectangular cover or a cluster-merge distance), a
//! search mode (binary, or range with weight sets) and the budget. The engine
//! builds the partitioner, searches, evaluates metrics and returns a
//! `RunReport` that can be exported next to the partitioning files.

pub mod job;
pub mod replay;
pub mod report;
pub mod runtime;

pub use job::{JobSpec, Policy, SearchPolicy};
pub use report::{RangeReport, RunReport, Selection};
pub use runtime::{Engine, ExecError};
