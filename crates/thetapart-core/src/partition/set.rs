use std::collections::BTreeSet;

use serde::Serialize;

use super::{CostKind, FreeformPartition, Partition, PartitionCells, RectangularPartition};
use crate::id::PartitionId;
use crate::matrix::JoinMatrix;

/// A finalized partition of either shape.
#[derive(Debug, Clone)]
pub enum PartitionShape {
    Rectangular(RectangularPartition),
    Freeform(FreeformPartition),
}

impl Partition for PartitionShape {
    fn cells_state(&self) -> &PartitionCells {
        match self {
            PartitionShape::Rectangular(p) => p.cells_state(),
            PartitionShape::Freeform(p) => p.cells_state(),
        }
    }

    fn cells_state_mut(&mut self) -> &mut PartitionCells {
        match self {
            PartitionShape::Rectangular(p) => p.cells_state_mut(),
            PartitionShape::Freeform(p) => p.cells_state_mut(),
        }
    }
}

impl From<RectangularPartition> for PartitionShape {
    fn from(p: RectangularPartition) -> Self {
        PartitionShape::Rectangular(p)
    }
}

impl From<FreeformPartition> for PartitionShape {
    fn from(p: FreeformPartition) -> Self {
        PartitionShape::Freeform(p)
    }
}

/// For each bucket of S and T, the partitions that need it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketMapping {
    pub s: Vec<BTreeSet<PartitionId>>,
    pub t: Vec<BTreeSet<PartitionId>>,
}

/// Result of one successful feasibility probe.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    partitions: Vec<PartitionShape>,
    threshold: u64,
    cost_kind: CostKind,
}

impl PartitionSet {
    /// Take ownership and renumber partitions densely as `0..len` in the
    /// order given.
    pub fn new<P: Into<PartitionShape>>(
        partitions: Vec<P>,
        threshold: u64,
        cost_kind: CostKind,
    ) -> Self {
        let partitions = partitions
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut p = p.into();
                p.set_id(PartitionId::new(i as u32));
                p
            })
            .collect();
        Self {
            partitions,
            threshold,
            cost_kind,
        }
    }

    pub fn partitions(&self) -> &[PartitionShape] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Threshold of the probe that produced this set.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn cost_kind(&self) -> CostKind {
        self.cost_kind
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartitionShape> {
        self.partitions.iter()
    }

    pub fn input_costs(&self, m: &JoinMatrix) -> Vec<(PartitionId, u64)> {
        self.partitions
            .iter()
            .map(|p| (p.id(), p.input_cost(m)))
            .collect()
    }

    /// Largest per-partition cost of the given kind (0 for an empty set).
    pub fn max_cost(&self, kind: CostKind, m: &JoinMatrix) -> u64 {
        self.partitions
            .iter()
            .map(|p| p.cost(kind, m))
            .max()
            .unwrap_or(0)
    }

    pub fn bucket_mapping(&self, m: &JoinMatrix) -> BucketMapping {
        let mut mapping = BucketMapping {
            s: vec![BTreeSet::new(); m.buckets_s()],
            t: vec![BTreeSet::new(); m.buckets_t()],
        };
        for p in &self.partitions {
            for &i in p.rows() {
                mapping.s[i].insert(p.id());
            }
            for &j in p.cols() {
                mapping.t[j].insert(p.id());
            }
        }
        mapping
    }

    /// Every candidate cell of `m` assigned to exactly one partition.
    pub fn covers_exactly(&self, m: &JoinMatrix) -> bool {
        let mut seen = BTreeSet::new();
        for p in &self.partitions {
            for c in p.cells() {
                if !seen.insert(*c) {
                    return false;
                }
            }
        }
        seen.len() as u64 == m.candidate_cell_count() && m.candidate_cells().all(|c| seen.contains(&c))
    }
}
