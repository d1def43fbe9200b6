//! Pairwise partition distances. Smaller means "merge first".

use std::fmt;
use std::str::FromStr;

use thetapart_core::error::PartitioningError;
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::partition::{FreeformPartition, Partition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMeasure {
    /// `1 - (|R∩| + |C∩|) / (|R∪| + |C∪|)` over bucket sets.
    JaccardBuckets,
    /// Mean `|Δrow| + |Δcol|` over all cell pairs.
    Manhattan,
    /// Merged input cost minus the larger of the two input costs.
    AddedInputCostPartitionMax,
    /// Merged cell count minus the larger of the two cell counts.
    AddedCandidateCellsPartitionMax,
    /// Merged input cost over the sum of both input costs.
    AddedInputCostPartitionSum,
    /// Smaller input cost of the two, or +∞ if the merge would exceed the cap.
    EmptiestPartitionInputCost,
    /// Smaller cell count of the two, or +∞ if the merge would exceed the cap.
    EmptiestPartitionCandidateCells,
    /// Like `AddedInputCostPartitionSum`, with rows and columns weighted.
    WeightedInputCostRowsColumns { w_rows: f64, w_cols: f64 },
}

impl fmt::Display for DistanceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMeasure::JaccardBuckets => f.write_str("jaccard"),
            DistanceMeasure::Manhattan => f.write_str("manhattan"),
            DistanceMeasure::AddedInputCostPartitionMax => f.write_str("added-input-max"),
            DistanceMeasure::AddedCandidateCellsPartitionMax => f.write_str("added-cells-max"),
            DistanceMeasure::AddedInputCostPartitionSum => f.write_str("added-input-sum"),
            DistanceMeasure::EmptiestPartitionInputCost => f.write_str("emptiest-input"),
            DistanceMeasure::EmptiestPartitionCandidateCells => f.write_str("emptiest-cells"),
            DistanceMeasure::WeightedInputCostRowsColumns { w_rows, w_cols } => {
                write!(f, "weighted:{w_rows}:{w_cols}")
            }
        }
    }
}

impl FromStr for DistanceMeasure {
    type Err = PartitioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(params) = s.strip_prefix("weighted:") {
            let (r, c) = params.split_once(':').ok_or_else(|| {
                PartitioningError::Config(format!("expected weighted:<rows>:<cols>, got '{s}'"))
            })?;
            let parse = |v: &str| {
                v.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite() && *w >= 0.0)
                    .ok_or_else(|| PartitioningError::Config(format!("bad weight '{v}' in '{s}'")))
            };
            return Ok(DistanceMeasure::WeightedInputCostRowsColumns {
                w_rows: parse(r)?,
                w_cols: parse(c)?,
            });
        }
        match s {
            "jaccard" => Ok(DistanceMeasure::JaccardBuckets),
            "manhattan" => Ok(DistanceMeasure::Manhattan),
            "added-input-max" => Ok(DistanceMeasure::AddedInputCostPartitionMax),
            "added-cells-max" => Ok(DistanceMeasure::AddedCandidateCellsPartitionMax),
            "added-input-sum" => Ok(DistanceMeasure::AddedInputCostPartitionSum),
            "emptiest-input" => Ok(DistanceMeasure::EmptiestPartitionInputCost),
            "emptiest-cells" => Ok(DistanceMeasure::EmptiestPartitionCandidateCells),
            other => Err(PartitioningError::Config(format!(
                "unknown distance measure '{other}'"
            ))),
        }
    }
}

/// Inputs shared by every distance evaluation.
#[derive(Debug, Clone, Copy)]
pub struct DistanceContext<'a> {
    pub matrix: &'a JoinMatrix,
    /// Merge cap for the emptiest-partition measures. `None` while the
    /// baseline is built; the probe threshold during replay.
    pub cap: Option<u64>,
}

fn ratio_or_one(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        1.0
    } else {
        num / den
    }
}

fn exceeds(cost: u64, cap: Option<u64>) -> bool {
    cap.is_some_and(|c| cost > c)
}

fn weighted_cost(p: &FreeformPartition, m: &JoinMatrix, w_rows: f64, w_cols: f64) -> f64 {
    let rows: u64 = p.rows().iter().map(|&i| m.counts_s()[i]).sum();
    let cols: u64 = p.cols().iter().map(|&j| m.counts_t()[j]).sum();
    w_rows * rows as f64 + w_cols * cols as f64
}

/// Distance between `a` and `b`. Pure: neither side is mutated.
pub fn distance(
    measure: DistanceMeasure,
    a: &FreeformPartition,
    b: &FreeformPartition,
    ctx: &DistanceContext<'_>,
) -> f64 {
    let m = ctx.matrix;
    match measure {
        DistanceMeasure::JaccardBuckets => {
            let inter = a.rows().intersection(b.rows()).count() + a.cols().intersection(b.cols()).count();
            let union = a.rows().union(b.rows()).count() + a.cols().union(b.cols()).count();
            1.0 - ratio_or_one(inter as f64, union as f64)
        }
        DistanceMeasure::Manhattan => {
            if a.cells().is_empty() || b.cells().is_empty() {
                return 0.0;
            }
            let mut total = 0.0;
            for ca in a.cells() {
                let sum: usize = b
                    .cells()
                    .iter()
                    .map(|cb| ca.row.abs_diff(cb.row) + ca.col.abs_diff(cb.col))
                    .sum();
                total += sum as f64 / b.cells().len() as f64;
            }
            total / a.cells().len() as f64
        }
        DistanceMeasure::AddedInputCostPartitionMax => {
            let merged = a.merged_input_cost(b, m);
            merged.saturating_sub(a.input_cost(m).max(b.input_cost(m))) as f64
        }
        DistanceMeasure::AddedCandidateCellsPartitionMax => {
            let merged = a.merged_cell_count(b);
            merged.saturating_sub(a.candidate_cell_count().max(b.candidate_cell_count())) as f64
        }
        DistanceMeasure::AddedInputCostPartitionSum => ratio_or_one(
            a.merged_input_cost(b, m) as f64,
            (a.input_cost(m) + b.input_cost(m)) as f64,
        ),
        DistanceMeasure::EmptiestPartitionInputCost => {
            if exceeds(a.merged_input_cost(b, m), ctx.cap) {
                f64::INFINITY
            } else {
                a.input_cost(m).min(b.input_cost(m)) as f64
            }
        }
        DistanceMeasure::EmptiestPartitionCandidateCells => {
            if exceeds(a.merged_cell_count(b), ctx.cap) {
                f64::INFINITY
            } else {
                a.candidate_cell_count().min(b.candidate_cell_count()) as f64
            }
        }
        DistanceMeasure::WeightedInputCostRowsColumns { w_rows, w_cols } => {
            if let (Some(ca), Some(cb)) = (single_cell(a), single_cell(b)) {
                // Two singletons: shared row/column is counted once in the union.
                let cs = m.counts_s();
                let ct = m.counts_t();
                let before = w_rows * (cs[ca.row] + cs[cb.row]) as f64
                    + w_cols * (ct[ca.col] + ct[cb.col]) as f64;
                let mut after = before;
                if ca.row == cb.row {
                    after -= w_rows * cs[ca.row] as f64;
                }
                if ca.col == cb.col {
                    after -= w_cols * ct[ca.col] as f64;
                }
                return ratio_or_one(after, before);
            }
            let rows: u64 = a.rows().union(b.rows()).map(|&i| m.counts_s()[i]).sum();
            let cols: u64 = a.cols().union(b.cols()).map(|&j| m.counts_t()[j]).sum();
            let merged = w_rows * rows as f64 + w_cols * cols as f64;
            ratio_or_one(
                merged,
                weighted_cost(a, m, w_rows, w_cols) + weighted_cost(b, m, w_rows, w_cols),
            )
        }
    }
}

fn single_cell(p: &FreeformPartition) -> Option<thetapart_core::matrix::CandidateCell> {
    if p.cells().len() == 1 {
        p.cells().iter().next().copied()
    } else {
        None
    }
}
