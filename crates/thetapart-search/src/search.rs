//! Cost-threshold search shared by every partitioner.
//!
//! A partitioner answers one question: can the matrix be covered by at most
//! `P` partitions, each costing at most `T`? Binary search finds the minimal
//! such `T`; range search samples a band of thresholds and scores each.

use std::str::FromStr;

use thetapart_core::error::{PartitioningError, Result};
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::metrics::{MetricsEvaluator, MetricsScore};
use thetapart_core::partition::{CostKind, PartitionSet};
use tracing::{debug, info, warn};

/// Feasibility oracle over a fixed matrix and partition budget.
pub trait Partitioner {
    fn name(&self) -> String;
    fn matrix(&self) -> &JoinMatrix;
    fn num_partitions(&self) -> usize;
    fn cost_kind(&self) -> CostKind;

    /// `(lower, upper)` for binary search; `lower <= upper`.
    fn default_bounds(&self) -> (u64, u64);

    /// Cover the matrix with at most `num_partitions()` partitions, each of
    /// cost `<= threshold`, or `None` if this probe cannot.
    fn feasible(&self, threshold: u64) -> Option<PartitionSet>;
}

/// Minimal feasible threshold and the partitions it produced.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub threshold: u64,
    pub partitions: PartitionSet,
    pub probes: u32,
}

/// Iterative binary search for the smallest feasible threshold in
/// `[lower, upper]`.
///
/// Feasibility is only monotone for a single partition. With more, the
/// result `t` is feasible and `t - 1` is not (or `t == lower`), but a
/// smaller feasible threshold may exist further down.
///
/// Fails with `InvertedBounds` if called with `lower > upper`, and with
/// `InfeasibleBudget` if the bounds cross during the search (nothing in the
/// range is feasible).
pub fn find_minimal_threshold<P: Partitioner + ?Sized>(
    p: &P,
    lower: u64,
    upper: u64,
) -> Result<SearchOutcome> {
    if lower > upper {
        return Err(PartitioningError::InvertedBounds { lower, upper });
    }

    let (mut lo, mut hi) = (lower, upper);
    let mut probes = 0u32;
    loop {
        if lo > hi {
            return Err(PartitioningError::InfeasibleBudget {
                partitions: p.num_partitions(),
                threshold: upper,
            });
        }
        let mid = lo + (hi - lo) / 2;
        probes += 1;
        match p.feasible(mid) {
            Some(set) => {
                debug!(partitioner = %p.name(), threshold = mid, partitions = set.len(), feasible = true, "probe");
                if lo == mid {
                    if mid == 0 {
                        warn!(partitioner = %p.name(), "minimal threshold is 0");
                    }
                    info!(
                        partitioner = %p.name(),
                        threshold = mid,
                        partitions = set.len(),
                        probes,
                        "binary search converged"
                    );
                    return Ok(SearchOutcome {
                        threshold: mid,
                        partitions: set,
                        probes,
                    });
                }
                hi = mid;
            }
            None => {
                debug!(partitioner = %p.name(), threshold = mid, feasible = false, "probe");
                match mid.checked_add(1) {
                    Some(next) => lo = next,
                    None => {
                        return Err(PartitioningError::InfeasibleBudget {
                            partitions: p.num_partitions(),
                            threshold: upper,
                        })
                    }
                }
            }
        }
    }
}

/// `granularity` evenly spaced thresholds from `upper` down to `lower`,
/// both endpoints included, duplicates dropped.
///
/// At most `upper - lower + 1` distinct thresholds exist, so a larger
/// granularity samples every integer in the range.
pub fn sample_thresholds(lower: u64, upper: u64, granularity: usize) -> Vec<u64> {
    if lower >= upper {
        return vec![upper];
    }
    let span = (upper - lower) as u128;
    let g = (granularity.max(2) as u128).min(span + 1);
    let mut out: Vec<u64> = Vec::with_capacity(usize::try_from(g).unwrap_or(usize::MAX));
    for i in 0..g {
        let t = upper - (i * span / (g - 1)) as u64;
        if out.last() != Some(&t) {
            out.push(t);
        }
    }
    out
}

/// Probe each sampled threshold from most to least permissive and collect
/// metrics, stopping at the first infeasible sample.
///
/// An infeasible first sample (`upper`) means the budget cannot be met at
/// all and is reported as `InfeasibleBudget`.
pub fn range_search<P: Partitioner + ?Sized>(
    p: &P,
    lower: u64,
    upper: u64,
    granularity: usize,
) -> Result<Vec<MetricsScore>> {
    if lower > upper {
        return Err(PartitioningError::InvertedBounds { lower, upper });
    }
    let evaluator = MetricsEvaluator::new(p.matrix());
    let mut scores = Vec::new();
    for (i, t) in sample_thresholds(lower, upper, granularity).into_iter().enumerate() {
        match p.feasible(t) {
            Some(set) => {
                info!(partitioner = %p.name(), threshold = t, partitions = set.len(), "range sample");
                scores.push(evaluator.evaluate(&set));
            }
            None if i == 0 => {
                return Err(PartitioningError::InfeasibleBudget {
                    partitions: p.num_partitions(),
                    threshold: t,
                });
            }
            None => {
                debug!(partitioner = %p.name(), threshold = t, "range sample infeasible, stopping");
                break;
            }
        }
    }
    Ok(scores)
}

/// Metric weights, parsed from `name=w,name=w`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weights(pub Vec<(String, f64)>);

impl Weights {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Weights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (k, w)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={w}")?;
        }
        Ok(())
    }
}

impl FromStr for Weights {
    type Err = PartitioningError;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, w) = part.split_once('=').ok_or_else(|| {
                PartitioningError::Config(format!("weight '{part}' is not name=value"))
            })?;
            let w: f64 = w
                .trim()
                .parse()
                .map_err(|_| PartitioningError::Config(format!("weight '{part}' is not a number")))?;
            if !w.is_finite() {
                return Err(PartitioningError::Config(format!("weight '{part}' is not finite")));
            }
            out.push((name.trim().to_string(), w));
        }
        if out.is_empty() {
            return Err(PartitioningError::Config("empty weight set".into()));
        }
        Ok(Weights(out))
    }
}

/// Each metric divided by its maximum over `scores` (0 where that max is 0).
pub fn normalize(scores: &[MetricsScore]) -> Vec<MetricsScore> {
    let Some(first) = scores.first() else {
        return Vec::new();
    };
    let maxima: Vec<f64> = (0..first.metrics.len())
        .map(|k| {
            scores
                .iter()
                .filter_map(|s| s.metrics.get(k).map(|(_, v)| *v))
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect();
    scores
        .iter()
        .map(|s| {
            let mut n = s.clone();
            for (k, (_, v)) in n.metrics.iter_mut().enumerate() {
                let max = maxima.get(k).copied().unwrap_or(0.0);
                *v = if max == 0.0 { 0.0 } else { *v / max };
            }
            n
        })
        .collect()
}

/// Score every sample with `weights` over max-normalized metrics, sort the
/// samples ascending by score (stable: equal scores keep sampling order)
/// and return the best one.
pub fn best_by_weighted_score(scores: &mut [MetricsScore], weights: &Weights) -> Result<MetricsScore> {
    let Some(first) = scores.first() else {
        return Err(PartitioningError::Config(
            "no range-search samples to score".into(),
        ));
    };
    let mut keys = Vec::with_capacity(weights.0.len());
    for (name, w) in weights.iter() {
        let k = first
            .metrics
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| PartitioningError::Config(format!("unknown metric '{name}' in weights")))?;
        keys.push((k, w));
    }

    let normalized = normalize(scores);
    for (s, n) in scores.iter_mut().zip(&normalized) {
        s.score = keys
            .iter()
            .map(|&(k, w)| w * n.metrics.get(k).map_or(0.0, |(_, v)| *v))
            .sum();
    }

    // Selection sort; rotating instead of swapping keeps it stable.
    for i in 0..scores.len() {
        let mut min = i;
        for j in (i + 1)..scores.len() {
            if scores[j].score < scores[min].score {
                min = j;
            }
        }
        scores[i..=min].rotate_right(1);
    }
    Ok(scores[0].clone())
}
