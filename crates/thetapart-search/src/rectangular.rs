//! Greedy row-band cover producing rectangular partitions.
//!
//! Rows are consumed top to bottom. For each starting row, every band height
//! is tried; a band is split into column-contiguous rectangles by a greedy
//! left-to-right sweep, and the band maximizing `area / rectangles` wins
//! (ties go to the taller band). Bucket order matters here.

use std::ops::RangeInclusive;

use thetapart_core::error::{PartitioningError, Result};
use thetapart_core::id::PartitionId;
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::partition::{CostKind, Partition, PartitionSet, RectangularPartition};

use crate::search::Partitioner;

#[derive(Debug, Clone)]
pub struct RectangularCoverPartitioner<'a> {
    matrix: &'a JoinMatrix,
    num_partitions: usize,
    cost_kind: CostKind,
}

impl<'a> RectangularCoverPartitioner<'a> {
    pub fn new(matrix: &'a JoinMatrix, num_partitions: usize, cost_kind: CostKind) -> Result<Self> {
        if num_partitions == 0 {
            return Err(PartitioningError::Config(
                "num_partitions must be at least 1".into(),
            ));
        }
        Ok(Self {
            matrix,
            num_partitions,
            cost_kind,
        })
    }

    /// Split the band `rows` into rectangles, sweeping columns left to right.
    ///
    /// A rectangle is closed when the next column would not fit and it already
    /// holds a candidate cell. A trailing empty rectangle is folded into the
    /// previous one. Rectangles may still exceed `threshold` when a single
    /// column does; the caller checks.
    fn cover_rows(&self, rows: RangeInclusive<usize>, threshold: u64) -> Vec<RectangularPartition> {
        let m = self.matrix;
        let kind = self.cost_kind;
        let placeholder = PartitionId::new(0);

        let mut regions = Vec::new();
        let mut r = RectangularPartition::new(placeholder, rows.clone(), 0);
        let mut used = 0u64;

        for col in 0..m.buckets_t() {
            let marginal = r.marginal_cost(kind, m, col);
            let cap = i128::from(threshold) - i128::from(used);
            if cap < i128::from(marginal) && !r.is_empty() {
                r.compute_output_cost(m);
                regions.push(r);
                r = RectangularPartition::new(placeholder, rows.clone(), col);
                used = r.marginal_cost(kind, m, col);
            } else {
                used += marginal;
            }
            r.add_column(m, col);
        }

        match regions.last_mut() {
            Some(last) if r.is_empty() => {
                let from = last.col_span().map_or(0, |c| c.end() + 1);
                for col in from..m.buckets_t() {
                    last.add_column(m, col);
                }
                last.compute_output_cost(m);
            }
            _ => {
                r.compute_output_cost(m);
                regions.push(r);
            }
        }
        regions
    }

    /// Best band starting at `row_start`: its last row and its rectangles.
    /// `None` if even the one-row band has a rectangle over `threshold`.
    fn cover_sub_matrix(
        &self,
        row_start: usize,
        threshold: u64,
    ) -> Option<(usize, Vec<RectangularPartition>)> {
        let m = self.matrix;
        let mut best: Option<(f64, usize, Vec<RectangularPartition>)> = None;

        for row_end in row_start..m.buckets_s() {
            let rects = self.cover_rows(row_start..=row_end, threshold);
            if rects.iter().any(|r| r.cost(self.cost_kind, m) > threshold) {
                break;
            }
            let area = m.candidate_cells_in_rows(row_start..=row_end);
            let score = area as f64 / rects.len() as f64;
            if best.as_ref().map_or(true, |(s, _, _)| score >= *s) {
                best = Some((score, row_end, rects));
            }
        }
        best.map(|(_, row_end, rects)| (row_end, rects))
    }
}

impl Partitioner for RectangularCoverPartitioner<'_> {
    fn name(&self) -> String {
        "rect".into()
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

    /// Input cost: `[2·sqrt(cc / P), size_s + size_t]`.
    /// Candidate cells: `[cc / P, cc]`.
    fn default_bounds(&self) -> (u64, u64) {
        let m = self.matrix;
        let cc = m.candidate_cell_count();
        let p = self.num_partitions as u64;
        let (lower, upper) = match self.cost_kind {
            CostKind::InputCost => (
                (2.0 * (cc as f64 / p as f64).sqrt()) as u64,
                m.total_size(),
            ),
            CostKind::CandidateCells => (cc / p, cc),
        };
        (lower.min(upper), upper)
    }

    fn feasible(&self, threshold: u64) -> Option<PartitionSet> {
        let mut remaining = self.num_partitions;
        let mut out = Vec::new();
        let mut row = 0;
        while row < self.matrix.buckets_s() {
            let (row_end, rects) = self.cover_sub_matrix(row, threshold)?;
            remaining = remaining.checked_sub(rects.len())?;
            out.extend(rects);
            row = row_end + 1;
        }
        Some(PartitionSet::new(out, threshold, self.cost_kind))
    }
}
