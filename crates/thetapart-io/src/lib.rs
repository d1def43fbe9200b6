#![forbid(unsafe_code)]
//! thetapart-io: file formats around the partitioner.
//!
//! Responsibilities:
//! - Read a matrix directory (grid, bucket boundaries, counts, properties).
//! - Write the same directory back out.
//! - Export a partitioning run for the join workers and for offline analysis.
//!
//! All files are header-less CSV except `rangeSearchMetrics*.csv`, and the
//! JSON report the exec crate writes next to them.

pub mod error;
pub mod export;
pub mod matrix_dir;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use export::PartitioningExporter;
pub use matrix_dir::MatrixDir;
