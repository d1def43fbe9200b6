//! Distribution statistics over a finalized partition set.
//!
//! Two families are reported:
//! - `cross_*`: S and T are distinct relations (denominators `size_s + size_t`,
//!   `buckets_s + buckets_t`).
//! - `self_*`: S and T are the same relation; a partition's buckets are the
//!   union of its row and column indices, costed against `count_s`.
//!
//! Keys are `{family}_{stat}_{quantity}`, e.g. `cross_max_input_cost`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::matrix::JoinMatrix;
use crate::partition::{Partition, PartitionSet};

pub const FAMILIES: [&str; 2] = ["cross", "self"];
pub const QUANTITIES: [&str; 4] = ["input_cost", "candidate_cells", "buckets", "buckets_per_cell"];
pub const STATS: [&str; 7] = [
    "max",
    "min",
    "mean",
    "median",
    "stdev",
    "replication",
    "imbalance",
];

/// Named metrics in insertion order plus a ranking score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsScore {
    /// Threshold of the probe the metrics describe.
    pub threshold: u64,
    pub metrics: Vec<(String, f64)>,
    pub score: f64,
}

impl MetricsScore {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            metrics: Vec::new(),
            score: 0.0,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.metrics.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for MetricsScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MetricsScore {}

impl PartialOrd for MetricsScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic over metric values in insertion order; `score` breaks ties.
impl Ord for MetricsScore {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((_, a), (_, b)) in self.metrics.iter().zip(&other.metrics) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.metrics
            .len()
            .cmp(&other.metrics.len())
            .then_with(|| self.score.total_cmp(&other.score))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Summary {
    max: f64,
    min: f64,
    mean: f64,
    median: f64,
    stdev: f64,
    sum: f64,
}

fn summarize(values: &[f64]) -> Summary {
    if values.is_empty() {
        return Summary::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let mean = sum / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    Summary {
        max: sorted[n - 1],
        min: sorted[0],
        mean,
        median,
        stdev: variance.sqrt(),
        sum,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Pure evaluator bound to one matrix.
#[derive(Debug, Clone, Copy)]
pub struct MetricsEvaluator<'a> {
    matrix: &'a JoinMatrix,
}

impl<'a> MetricsEvaluator<'a> {
    pub fn new(matrix: &'a JoinMatrix) -> Self {
        Self { matrix }
    }

    pub fn evaluate(&self, set: &PartitionSet) -> MetricsScore {
        let m = self.matrix;
        let n = set.len();
        let mut cross = [
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
            Vec::with_capacity(n),
        ];
        let mut selfj = cross.clone();

        for p in set.iter() {
            let cells = p.candidate_cell_count() as f64;

            let buckets = p.buckets_used() as f64;
            cross[0].push(p.input_cost(m) as f64);
            cross[1].push(cells);
            cross[2].push(buckets);
            cross[3].push(ratio(buckets, cells));

            let union: BTreeSet<usize> = p.rows().union(p.cols()).copied().collect();
            let self_cost: u64 = union
                .iter()
                .filter_map(|&k| m.counts_s().get(k))
                .sum();
            let self_buckets = union.len() as f64;
            selfj[0].push(self_cost as f64);
            selfj[1].push(cells);
            selfj[2].push(self_buckets);
            selfj[3].push(ratio(self_buckets, cells));
        }

        let cc = m.candidate_cell_count() as f64;
        let cross_den = [
            m.total_size() as f64,
            cc,
            (m.buckets_s() + m.buckets_t()) as f64,
        ];
        let self_den = [m.size_s() as f64, cc, m.buckets_s() as f64];

        let mut out = MetricsScore::new(set.threshold());
        for (family, values, den) in [("cross", &cross, cross_den), ("self", &selfj, self_den)] {
            let total_cells: f64 = values[1].iter().sum();
            let total_buckets: f64 = values[2].iter().sum();
            for (q, quantity) in QUANTITIES.iter().enumerate() {
                let s = summarize(&values[q]);
                let replication = match q {
                    3 => ratio(total_buckets, total_cells),
                    _ => ratio(s.sum, den[q]),
                };
                let stats = [
                    s.max,
                    s.min,
                    s.mean,
                    s.median,
                    s.stdev,
                    replication,
                    ratio(s.max, s.mean),
                ];
                for (stat, value) in STATS.iter().zip(stats) {
                    out.push(format!("{family}_{stat}_{quantity}"), value);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PartitionId;
    use crate::matrix::CandidateCell;
    use crate::partition::{CostKind, FreeformPartition};

    fn matrix() -> JoinMatrix {
        JoinMatrix::with_unit_bounds(
            vec![vec![1, 1, 0], vec![0, 1, 1], vec![0, 0, 1]],
            vec![1, 2, 3],
            vec![4, 5, 6],
        )
        .unwrap()
    }

    fn cells(list: &[(usize, usize)]) -> FreeformPartition {
        let mut p = FreeformPartition::new(PartitionId::new(0));
        for &(r, c) in list {
            p.add_cell(CandidateCell::new(r, c));
        }
        p
    }

    #[test]
    fn summary_handles_even_and_odd() {
        let s = summarize(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.mean, 2.5);
        assert!((s.stdev - 1.25f64.sqrt()).abs() < 1e-12);

        assert_eq!(summarize(&[5.0, 1.0, 3.0]).median, 3.0);
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn cross_and_self_families() {
        let m = matrix();
        // a: (0,0),(0,1) -> rows {0}, cols {0,1}
        // b: (1,1),(1,2),(2,2) -> rows {1,2}, cols {1,2}
        let a = cells(&[(0, 0), (0, 1)]);
        let b = cells(&[(1, 1), (1, 2), (2, 2)]);
        let set = PartitionSet::new(vec![a, b], 20, CostKind::InputCost);
        let s = MetricsEvaluator::new(&m).evaluate(&set);

        assert_eq!(s.threshold, 20);
        assert_eq!(s.metrics.len(), 2 * 4 * 7);
        assert_eq!(s.metrics[0].0, "cross_max_input_cost");
        assert_eq!(s.metrics[7].0, "cross_max_candidate_cells");
        assert_eq!(s.metrics[28].0, "self_max_input_cost");

        // Input costs: a = 1 + 4 + 5 = 10, b = 2 + 3 + 5 + 6 = 16.
        assert_eq!(s.get("cross_max_input_cost"), Some(16.0));
        assert_eq!(s.get("cross_min_input_cost"), Some(10.0));
        assert_eq!(s.get("cross_mean_input_cost"), Some(13.0));
        assert_eq!(s.get("cross_replication_input_cost"), Some(26.0 / 21.0));
        assert_eq!(s.get("cross_imbalance_input_cost"), Some(16.0 / 13.0));
        assert_eq!(s.get("cross_replication_candidate_cells"), Some(1.0));
        assert_eq!(s.get("cross_replication_buckets"), Some(7.0 / 6.0));
        assert_eq!(s.get("cross_replication_buckets_per_cell"), Some(7.0 / 5.0));

        // Self join: a uses {0,1} -> 1+2 = 3; b uses {1,2} -> 2+3 = 5.
        assert_eq!(s.get("self_max_input_cost"), Some(5.0));
        assert_eq!(s.get("self_replication_input_cost"), Some(8.0 / 6.0));
        assert_eq!(s.get("self_max_buckets"), Some(2.0));
        assert_eq!(s.get("self_replication_buckets"), Some(4.0 / 3.0));
    }

    #[test]
    fn empty_set_is_all_zero() {
        let m = matrix();
        let set = PartitionSet::new(Vec::<FreeformPartition>::new(), 0, CostKind::InputCost);
        let s = MetricsEvaluator::new(&m).evaluate(&set);
        assert_eq!(s.metrics.len(), 56);
        assert!(s.metrics.iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn ordering_is_lexicographic_then_score() {
        let mut a = MetricsScore::new(1);
        a.push("x", 1.0);
        a.push("y", 9.0);
        let mut b = MetricsScore::new(2);
        b.push("x", 2.0);
        b.push("y", 0.0);
        assert!(a < b);

        let mut c = a.clone();
        c.score = 1.0;
        assert!(a < c);
        assert_eq!(a, a.clone());
    }
}
