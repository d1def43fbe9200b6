#![forbid(unsafe_code)]
//! thetapart-core: the data model shared by every partitioning strategy.
//!
//! Responsibilities:
//! - `JoinMatrix`: the sparse bucket-pair cost grid plus per-bucket bounds/counts.
//! - `Partition` types: rectangular spans and free-form (mergeable) cell sets,
//!   both with a memoized input cost.
//! - `PartitionSet` + bucket-to-partition mapping handed to exporters.
//! - `MetricsEvaluator`/`MetricsScore` used for reporting and range-search scoring.
//!
//! **No I/O, no logging, no threads** here. Search and partitioners live in
//! `thetapart-search`; file formats in `thetapart-io`.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod matrix;
pub mod metrics;
pub mod partition;
pub mod prelude;

/// Crate version, recorded in run reports for provenance.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
