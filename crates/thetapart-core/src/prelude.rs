//! Convenient re-exports for downstream crates.

pub use crate::config::PartitionerConfig;
pub use crate::error::{PartitioningError, Result};
pub use crate::hash::{hash_matrix, Hash256};
pub use crate::id::PartitionId;
pub use crate::matrix::{BucketBounds, CandidateCell, JoinMatrix, Relation};
pub use crate::metrics::{MetricsEvaluator, MetricsScore};
pub use crate::partition::{
    BucketMapping, CostKind, FreeformPartition, Partition, PartitionSet, PartitionShape,
    RectangularPartition,
};
