//! Agglomerative cluster-merge partitioner.
//!
//! Starts from one partition per candidate cell and repeatedly merges the
//! closest pair (under a `DistanceMeasure`) whose union still fits the
//! threshold, until at most `P` partitions remain. Bucket order is irrelevant.

mod baseline;
mod distance;

pub use baseline::{BaselineState, MergeState, TriangularDistances};
pub use distance::{distance, DistanceContext, DistanceMeasure};

use thetapart_core::error::{PartitioningError, Result};
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::partition::{CostKind, PartitionSet};
use tracing::debug;

use crate::search::Partitioner;

#[derive(Debug, Clone)]
pub struct ClusterMergePartitioner<'a> {
    matrix: &'a JoinMatrix,
    num_partitions: usize,
    cost_kind: CostKind,
    measure: DistanceMeasure,
    baseline: BaselineState,
}

impl<'a> ClusterMergePartitioner<'a> {
    /// Builds the baseline distances up front (`O(cc²)` evaluations).
    pub fn new(
        matrix: &'a JoinMatrix,
        num_partitions: usize,
        cost_kind: CostKind,
        measure: DistanceMeasure,
    ) -> Result<Self> {
        if num_partitions == 0 {
            return Err(PartitioningError::Config(
                "num_partitions must be at least 1".into(),
            ));
        }
        let baseline = BaselineState::build(matrix, measure)?;
        debug!(
            measure = %measure,
            singletons = baseline.len(),
            distinct_distances = baseline.distinct_distances(),
            "cluster baseline built"
        );
        Ok(Self {
            matrix,
            num_partitions,
            cost_kind,
            measure,
            baseline,
        })
    }

    pub fn measure(&self) -> DistanceMeasure {
        self.measure
    }

    pub fn baseline(&self) -> &BaselineState {
        &self.baseline
    }
}

impl Partitioner for ClusterMergePartitioner<'_> {
    fn name(&self) -> String {
        self.measure.to_string()
    }

    fn matrix(&self) -> &JoinMatrix {
        self.matrix
    }

    fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    fn cost_kind(&self) -> CostKind {
        self.cost_kind
    }

    /// Input cost: `[1, size_s + size_t]`. Candidate cells: `[cc / P, cc]`.
    fn default_bounds(&self) -> (u64, u64) {
        let m = self.matrix;
        let (lower, upper) = match self.cost_kind {
            CostKind::InputCost => (1, m.total_size()),
            CostKind::CandidateCells => {
                let cc = m.candidate_cell_count();
                (cc / self.num_partitions as u64, cc)
            }
        };
        (lower.min(upper), upper)
    }

    fn feasible(&self, threshold: u64) -> Option<PartitionSet> {
        let m = self.matrix;
        let mut state = self.baseline.replay();
        // A singleton over the threshold can never shrink by merging.
        if state.any_over(self.cost_kind, m, threshold) {
            return None;
        }
        let ctx = DistanceContext {
            matrix: m,
            cap: Some(threshold),
        };
        while state.active() > self.num_partitions {
            let (a, b) = state.select_merge(self.cost_kind, m, threshold)?;
            state.merge(a, b, self.measure, &ctx);
        }
        Some(PartitionSet::new(
            state.into_partitions(),
            threshold,
            self.cost_kind,
        ))
    }
}
