#![forbid(unsafe_code)]
//! thetapart-search: threshold search and the partition-construction algorithms.
//!
//! Responsibilities:
//! - `Partitioner`: feasibility oracle "cover with ≤ P partitions of cost ≤ T?".
//! - Binary search for the minimal feasible threshold, range search over a
//!   threshold band, weighted selection of the best sample.
//! - `RectangularCoverPartitioner`: greedy row-band cover.
//! - `ClusterMergePartitioner`: agglomerative merging with pluggable distances.
//! - Debug-time verification helpers.
//!
//! **No I/O** here. Single-threaded and deterministic; every probe owns its
//! working state.

pub mod cluster;
pub mod rectangular;
pub mod search;
pub mod verify;

pub use cluster::{ClusterMergePartitioner, DistanceMeasure};
pub use rectangular::RectangularCoverPartitioner;
pub use search::{
    best_by_weighted_score, find_minimal_threshold, normalize, range_search, sample_thresholds,
    Partitioner, SearchOutcome, Weights,
};
