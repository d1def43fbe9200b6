use super::{bucket_cost, Partition, PartitionCells};
use crate::id::PartitionId;
use crate::matrix::{CandidateCell, JoinMatrix};

/// Arbitrary set of candidate cells; grows by merging.
#[derive(Debug, Clone)]
pub struct FreeformPartition {
    cells: PartitionCells,
}

impl FreeformPartition {
    pub fn new(id: PartitionId) -> Self {
        Self {
            cells: PartitionCells::new(id),
        }
    }

    pub fn singleton(id: PartitionId, cell: CandidateCell) -> Self {
        let mut p = Self::new(id);
        p.cells.insert(cell);
        p
    }

    pub fn add_cell(&mut self, cell: CandidateCell) {
        self.cells.insert(cell);
    }

    /// Union `other` into `self`; the cost memo goes stale.
    pub fn merge(&mut self, other: &FreeformPartition) {
        self.cells.absorb(&other.cells);
    }

    /// Input cost the union would have, without mutating either side.
    pub fn merged_input_cost(&self, other: &FreeformPartition, m: &JoinMatrix) -> u64 {
        bucket_cost(
            m,
            self.rows().union(other.rows()),
            self.cols().union(other.cols()),
        )
    }

    pub fn merged_cell_count(&self, other: &FreeformPartition) -> u64 {
        self.cells().union(other.cells()).count() as u64
    }
}

impl Partition for FreeformPartition {
    fn cells_state(&self) -> &PartitionCells {
        &self.cells
    }

    fn cells_state_mut(&mut self) -> &mut PartitionCells {
        &mut self.cells
    }
}
