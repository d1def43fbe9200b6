//! Baseline distance state and the per-probe merge replay.
//!
//! The baseline (singletons + all pairwise distances) is built once per
//! partitioner. A probe clones it into a `MergeState` and replays merges
//! under its own threshold; the baseline itself is never mutated.

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;
use thetapart_core::error::{PartitioningError, Result};
use thetapart_core::id::PartitionId;
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::partition::{CostKind, FreeformPartition, Partition};

use super::distance::{distance, DistanceContext, DistanceMeasure};

type Pair = (u32, u32);
type DistanceIndex = BTreeMap<OrderedFloat<f64>, BTreeSet<Pair>>;

/// Upper-triangular `n × n` matrix without the diagonal, flattened.
#[derive(Debug, Clone)]
pub struct TriangularDistances {
    n: usize,
    values: Vec<f64>,
}

impl TriangularDistances {
    pub fn new(n: usize) -> Self {
        let len = n * n.saturating_sub(1) / 2;
        Self {
            n,
            values: vec![0.0; len],
        }
    }

    #[inline]
    fn slot(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        debug_assert!(j < self.n && i != j);
        i * (2 * self.n - i - 1) / 2 + (j - i - 1)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.slot(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, d: f64) {
        let s = self.slot(i, j);
        self.values[s] = d;
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}

fn index_insert(index: &mut DistanceIndex, d: f64, pair: Pair) {
    index.entry(OrderedFloat(d)).or_default().insert(pair);
}

fn index_remove(index: &mut DistanceIndex, d: f64, pair: Pair) {
    let key = OrderedFloat(d);
    if let Some(set) = index.get_mut(&key) {
        set.remove(&pair);
        if set.is_empty() {
            index.remove(&key);
        }
    }
}

fn pair(i: usize, j: usize) -> Pair {
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    (i as u32, j as u32)
}

/// Singletons and their pairwise distances, computed once.
#[derive(Debug, Clone)]
pub struct BaselineState {
    partitions: Vec<FreeformPartition>,
    distances: TriangularDistances,
    index: DistanceIndex,
}

impl BaselineState {
    /// One singleton per candidate cell in row-major order, and the
    /// distance of every unordered pair (no emptiest-measure cap).
    pub fn build(m: &JoinMatrix, measure: DistanceMeasure) -> Result<Self> {
        let partitions: Vec<FreeformPartition> = m
            .candidate_cells()
            .enumerate()
            .map(|(i, cell)| FreeformPartition::singleton(PartitionId::new(i as u32), cell))
            .collect();
        let n = partitions.len();
        if u32::try_from(n).is_err() {
            return Err(PartitioningError::MalformedInput(format!(
                "{n} candidate cells exceed the cluster partitioner's pair index"
            )));
        }

        let ctx = DistanceContext { matrix: m, cap: None };
        let mut distances = TriangularDistances::new(n);
        let mut index = DistanceIndex::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(measure, &partitions[i], &partitions[j], &ctx);
                distances.set(i, j, d);
                index_insert(&mut index, d, pair(i, j));
            }
        }
        Ok(Self {
            partitions,
            distances,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn distances(&self) -> &TriangularDistances {
        &self.distances
    }

    pub fn partitions(&self) -> &[FreeformPartition] {
        &self.partitions
    }

    /// Number of distinct distance values in the index.
    pub fn distinct_distances(&self) -> usize {
        self.index.len()
    }

    /// Fresh working copy for one probe.
    pub fn replay(&self) -> MergeState {
        MergeState {
            partitions: self.partitions.iter().cloned().map(Some).collect(),
            distances: self.distances.clone(),
            index: self.index.clone(),
            active: self.partitions.len(),
        }
    }
}

/// Working state of one probe. `None` slots were merged away.
#[derive(Debug, Clone)]
pub struct MergeState {
    partitions: Vec<Option<FreeformPartition>>,
    distances: TriangularDistances,
    index: DistanceIndex,
    active: usize,
}

impl MergeState {
    pub fn active(&self) -> usize {
        self.active
    }

    fn partition(&self, i: usize) -> Option<&FreeformPartition> {
        self.partitions.get(i).and_then(Option::as_ref)
    }

    /// Any live partition whose own cost already exceeds `threshold`.
    pub fn any_over(&self, kind: CostKind, m: &JoinMatrix, threshold: u64) -> bool {
        self.partitions
            .iter()
            .flatten()
            .any(|p| p.cost(kind, m) > threshold)
    }

    /// First pair in distance order whose union fits `threshold`.
    /// `None` means no merge is possible.
    pub fn select_merge(&self, kind: CostKind, m: &JoinMatrix, threshold: u64) -> Option<(usize, usize)> {
        for pairs in self.index.values() {
            for &(a, b) in pairs {
                let (a, b) = (a as usize, b as usize);
                let (Some(pa), Some(pb)) = (self.partition(a), self.partition(b)) else {
                    continue;
                };
                let merged = match kind {
                    CostKind::InputCost => pa.merged_input_cost(pb, m),
                    CostKind::CandidateCells => pa.merged_cell_count(pb),
                };
                if merged <= threshold {
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// Merge `b` into `a`, drop every pair that mentions either, and
    /// re-index `a` against all remaining live partitions.
    pub fn merge(&mut self, a: usize, b: usize, measure: DistanceMeasure, ctx: &DistanceContext<'_>) {
        let Some(pb) = self.partitions.get_mut(b).and_then(Option::take) else {
            return;
        };
        let live: Vec<usize> = (0..self.partitions.len())
            .filter(|&k| self.partitions[k].is_some())
            .collect();

        for &k in &live {
            if k != a {
                index_remove(&mut self.index, self.distances.get(a, k), pair(a, k));
            }
        }
        // `b` is no longer live, so this also drops the (a, b) entry.
        for &k in &live {
            index_remove(&mut self.index, self.distances.get(b, k), pair(b, k));
        }

        if let Some(pa) = self.partitions[a].as_mut() {
            pa.merge(&pb);
        }
        self.active -= 1;

        for &k in &live {
            if k == a {
                continue;
            }
            let (Some(pa), Some(pk)) = (self.partition(a), self.partition(k)) else {
                continue;
            };
            let d = distance(measure, pa, pk, ctx);
            self.distances.set(a, k, d);
            index_insert(&mut self.index, d, pair(a, k));
        }
    }

    /// Live partitions in slot order.
    pub fn into_partitions(self) -> Vec<FreeformPartition> {
        self.partitions.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_slots_are_dense() {
        let mut t = TriangularDistances::new(4);
        let mut k = 0.0;
        for i in 0..4 {
            for j in (i + 1)..4 {
                t.set(j, i, k);
                k += 1.0;
            }
        }
        assert_eq!(t.values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(t.get(2, 3), 5.0);
        assert_eq!(TriangularDistances::new(1).values.len(), 0);
    }

    #[test]
    fn replay_leaves_baseline_untouched() {
        let m = JoinMatrix::with_unit_bounds(vec![vec![1, 1], vec![1, 0]], vec![1, 1], vec![1, 1])
            .unwrap();
        let base = BaselineState::build(&m, DistanceMeasure::AddedInputCostPartitionMax).unwrap();
        assert_eq!(base.len(), 3);
        let before = base.distinct_distances();

        let mut state = base.replay();
        let ctx = DistanceContext { matrix: &m, cap: Some(3) };
        let (a, b) = state
            .select_merge(CostKind::InputCost, &m, 3)
            .expect("a pair sharing a bucket fits");
        assert!(a < b);
        state.merge(a, b, DistanceMeasure::AddedInputCostPartitionMax, &ctx);
        assert_eq!(state.active(), 2);
        assert_eq!(base.distinct_distances(), before);
        assert_eq!(base.len(), 3);
        assert_eq!(state.into_partitions().len(), 2);
    }
}
