//! Partitions: groups of candidate cells assigned to one worker.
//!
//! Both shapes share `PartitionCells`, which owns the bucket/cell sets and a
//! memoized input cost. The memo is an explicit dirty flag plus cached value;
//! every structural mutation goes through `PartitionCells` and sets the flag.

mod freeform;
mod rectangular;
mod set;

pub use freeform::FreeformPartition;
pub use rectangular::{RectSpan, RectangularPartition};
pub use set::{BucketMapping, PartitionSet, PartitionShape};

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PartitioningError;
use crate::id::PartitionId;
use crate::matrix::{CandidateCell, JoinMatrix};

/// Which per-partition quantity a threshold bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostKind {
    /// Σ count_s over used rows + Σ count_t over used columns.
    #[default]
    InputCost,
    /// Number of candidate cells in the partition.
    CandidateCells,
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostKind::InputCost => f.write_str("input-cost"),
            CostKind::CandidateCells => f.write_str("candidate-cells"),
        }
    }
}

impl FromStr for CostKind {
    type Err = PartitioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input-cost" | "input_cost" | "input" => Ok(CostKind::InputCost),
            "candidate-cells" | "candidate_cells" | "cells" => Ok(CostKind::CandidateCells),
            other => Err(PartitioningError::Config(format!(
                "unknown cost kind '{other}' (expected input-cost or candidate-cells)"
            ))),
        }
    }
}

/// Bucket and cell sets of one partition, with a memoized input cost.
///
/// Ordered sets keep every iteration (exports, distance sums) deterministic.
/// The cached cost is only valid for the matrix it was computed against;
/// callers never mix matrices within a run.
#[derive(Debug, Clone)]
pub struct PartitionCells {
    id: PartitionId,
    rows: BTreeSet<usize>,
    cols: BTreeSet<usize>,
    cells: BTreeSet<CandidateCell>,
    dirty: Cell<bool>,
    cached_input_cost: Cell<u64>,
}

impl PartitionCells {
    pub fn new(id: PartitionId) -> Self {
        Self {
            id,
            rows: BTreeSet::new(),
            cols: BTreeSet::new(),
            cells: BTreeSet::new(),
            dirty: Cell::new(true),
            cached_input_cost: Cell::new(0),
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn set_id(&mut self, id: PartitionId) {
        self.id = id;
    }

    pub fn rows(&self) -> &BTreeSet<usize> {
        &self.rows
    }

    pub fn cols(&self) -> &BTreeSet<usize> {
        &self.cols
    }

    pub fn cells(&self) -> &BTreeSet<CandidateCell> {
        &self.cells
    }

    pub fn insert(&mut self, cell: CandidateCell) {
        self.rows.insert(cell.row);
        self.cols.insert(cell.col);
        self.cells.insert(cell);
        self.dirty.set(true);
    }

    /// Union `other` into `self`.
    pub fn absorb(&mut self, other: &PartitionCells) {
        self.rows.extend(other.rows.iter().copied());
        self.cols.extend(other.cols.iter().copied());
        self.cells.extend(other.cells.iter().copied());
        self.dirty.set(true);
    }

    pub fn is_cost_stale(&self) -> bool {
        self.dirty.get()
    }

    pub fn input_cost(&self, m: &JoinMatrix) -> u64 {
        if !self.dirty.get() {
            return self.cached_input_cost.get();
        }
        let cost = bucket_cost(m, &self.rows, &self.cols);
        self.cached_input_cost.set(cost);
        self.dirty.set(false);
        cost
    }
}

/// Σ count_s over `rows` + Σ count_t over `cols`.
pub(crate) fn bucket_cost<'a, R, C>(m: &JoinMatrix, rows: R, cols: C) -> u64
where
    R: IntoIterator<Item = &'a usize>,
    C: IntoIterator<Item = &'a usize>,
{
    let cs = m.counts_s();
    let ct = m.counts_t();
    rows.into_iter().map(|&i| cs[i]).sum::<u64>() + cols.into_iter().map(|&j| ct[j]).sum::<u64>()
}

/// Shared behaviour of every partition shape.
pub trait Partition {
    fn cells_state(&self) -> &PartitionCells;
    fn cells_state_mut(&mut self) -> &mut PartitionCells;

    fn id(&self) -> PartitionId {
        self.cells_state().id()
    }

    fn set_id(&mut self, id: PartitionId) {
        self.cells_state_mut().set_id(id);
    }

    fn rows(&self) -> &BTreeSet<usize> {
        self.cells_state().rows()
    }

    fn cols(&self) -> &BTreeSet<usize> {
        self.cells_state().cols()
    }

    fn cells(&self) -> &BTreeSet<CandidateCell> {
        self.cells_state().cells()
    }

    /// Memoized; recomputed only after a mutation.
    fn input_cost(&self, m: &JoinMatrix) -> u64 {
        self.cells_state().input_cost(m)
    }

    fn candidate_cell_count(&self) -> u64 {
        self.cells().len() as u64
    }

    /// Distinct rows plus distinct columns.
    fn buckets_used(&self) -> usize {
        self.rows().len() + self.cols().len()
    }

    fn cost(&self, kind: CostKind, m: &JoinMatrix) -> u64 {
        match kind {
            CostKind::InputCost => self.input_cost(m),
            CostKind::CandidateCells => self.candidate_cell_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> JoinMatrix {
        JoinMatrix::with_unit_bounds(
            vec![vec![1, 1, 0], vec![0, 1, 1]],
            vec![10, 20],
            vec![1, 2, 3],
        )
        .unwrap()
    }

    #[test]
    fn memo_is_idempotent_and_invalidated() {
        let m = matrix();
        let mut p = PartitionCells::new(PartitionId::new(0));
        p.insert(CandidateCell::new(0, 0));
        assert!(p.is_cost_stale());
        assert_eq!(p.input_cost(&m), 11);
        assert!(!p.is_cost_stale());
        assert_eq!(p.input_cost(&m), 11);

        // Same row, new column: only T side grows.
        p.insert(CandidateCell::new(0, 1));
        assert!(p.is_cost_stale());
        assert_eq!(p.input_cost(&m), 13);

        // Re-inserting an existing cell marks stale but leaves the value.
        p.insert(CandidateCell::new(0, 1));
        assert_eq!(p.input_cost(&m), 13);
    }

    #[test]
    fn cost_kind_parses_and_displays() {
        assert_eq!("input-cost".parse::<CostKind>().unwrap(), CostKind::InputCost);
        assert_eq!(
            "Candidate_Cells".parse::<CostKind>().unwrap(),
            CostKind::CandidateCells
        );
        assert!("bytes".parse::<CostKind>().is_err());
        assert_eq!(CostKind::CandidateCells.to_string(), "candidate-cells");
    }
}
