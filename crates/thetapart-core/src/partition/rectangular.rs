use std::ops::RangeInclusive;

use serde::Serialize;

use super::{CostKind, Partition, PartitionCells};
use crate::id::PartitionId;
use crate::matrix::{CandidateCell, JoinMatrix};

/// Axis-aligned partition over a row band and a contiguous column span.
///
/// Only candidate cells inside the span are members; rows/columns without a
/// candidate cell do not contribute to the input cost.
#[derive(Debug, Clone)]
pub struct RectangularPartition {
    cells: PartitionCells,
    row_start: usize,
    row_end: usize,
    col_start: usize,
    /// Unset until the first column is added.
    col_end: Option<usize>,
    output_cost: Option<u64>,
}

/// Serializable span of a rectangle, as exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RectSpan {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl RectangularPartition {
    pub fn new(id: PartitionId, rows: RangeInclusive<usize>, col_start: usize) -> Self {
        Self {
            cells: PartitionCells::new(id),
            row_start: *rows.start(),
            row_end: *rows.end(),
            col_start,
            col_end: None,
            output_cost: None,
        }
    }

    pub fn row_span(&self) -> RangeInclusive<usize> {
        self.row_start..=self.row_end
    }

    pub fn col_span(&self) -> Option<RangeInclusive<usize>> {
        self.col_end.map(|end| self.col_start..=end)
    }

    pub fn span(&self) -> Option<RectSpan> {
        self.col_end.map(|col_end| RectSpan {
            row_start: self.row_start,
            row_end: self.row_end,
            col_start: self.col_start,
            col_end,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cells.cells().is_empty()
    }

    /// Cost added by extending the rectangle with column `col`.
    ///
    /// Input cost: counts of band rows that gain their first candidate cell,
    /// plus `count_t[col]` once if the column has any candidate in the band.
    /// Candidate cells: number of candidates of `col` inside the band.
    pub fn marginal_cost(&self, kind: CostKind, m: &JoinMatrix, col: usize) -> u64 {
        match kind {
            CostKind::InputCost => {
                let mut cost = 0u64;
                let mut column_found = false;
                for i in self.row_span() {
                    if !m.is_candidate(i, col) {
                        continue;
                    }
                    if !self.cells.rows().contains(&i) {
                        cost += m.counts_s()[i];
                    }
                    if !column_found && !self.cells.cols().contains(&col) {
                        cost += m.counts_t()[col];
                        column_found = true;
                    }
                }
                cost
            }
            CostKind::CandidateCells => self
                .row_span()
                .filter(|&i| m.is_candidate(i, col))
                .count() as u64,
        }
    }

    /// Add every candidate of `col` within the band and move the right edge.
    pub fn add_column(&mut self, m: &JoinMatrix, col: usize) {
        for i in self.row_span() {
            if m.is_candidate(i, col) {
                self.cells.insert(CandidateCell::new(i, col));
            }
        }
        self.col_end = Some(col);
        self.output_cost = None;
    }

    /// Σ count_s[i] * count_t[j] over candidate cells in the span.
    pub fn compute_output_cost(&mut self, m: &JoinMatrix) -> u64 {
        let cost = match self.col_span() {
            Some(cols) => self
                .row_span()
                .flat_map(|i| cols.clone().map(move |j| (i, j)))
                .filter(|&(i, j)| m.is_candidate(i, j))
                .map(|(i, j)| m.output_weight(i, j))
                .sum(),
            None => 0,
        };
        self.output_cost = Some(cost);
        cost
    }

    /// `None` until `compute_output_cost` has run since the last mutation.
    pub fn output_cost(&self) -> Option<u64> {
        self.output_cost
    }
}

impl Partition for RectangularPartition {
    fn cells_state(&self) -> &PartitionCells {
        &self.cells
    }

    fn cells_state_mut(&mut self) -> &mut PartitionCells {
        &mut self.cells
    }
}
