//! Runtime: build the partitioner a job asks for, search, and report.
//!
//! Flow:
//! - Overlay the job on the engine's `PartitionerConfig` and validate.
//! - Binary search over the partitioner's default bounds.
//! - Range search (optional): sweep `[base, base * upper_factor]` where
//!   `base` is the binary-search optimum's max cost, then re-execute the best
//!   sample of every weight set.
//! - Debug builds re-check every returned set (cost, budget, exact cover).

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use thetapart_core::config::PartitionerConfig;
use thetapart_core::error::PartitioningError;
use thetapart_core::hash::{hash_matrix, hash_serde, Hash256};
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::metrics::MetricsEvaluator;
use thetapart_core::partition::{CostKind, PartitionSet};
use thetapart_search::{
    best_by_weighted_score, find_minimal_threshold, normalize, range_search,
    ClusterMergePartitioner, Partitioner, RectangularCoverPartitioner, Weights,
};

use crate::job::{JobSpec, Policy};
use crate::report::{RangeReport, RunReport, Selection};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] PartitioningError),
    #[error(transparent)]
    Io(#[from] thetapart_io::Error),
    #[error("job: {0}")]
    Job(String),
}

/// Engine owns the defaults a job overrides.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    cfg: PartitionerConfig,
}

impl Engine {
    pub fn new(cfg: PartitionerConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PartitionerConfig {
        &self.cfg
    }

    /// Build the partitioner named by `policy`.
    pub fn partitioner<'a>(
        &self,
        m: &'a JoinMatrix,
        policy: Policy,
        cfg: &PartitionerConfig,
    ) -> Result<Box<dyn Partitioner + 'a>, ExecError> {
        Ok(match policy {
            Policy::Rect => Box::new(RectangularCoverPartitioner::new(
                m,
                cfg.num_partitions,
                cfg.cost_kind,
            )?),
            Policy::Cluster(measure) => Box::new(ClusterMergePartitioner::new(
                m,
                cfg.num_partitions,
                cfg.cost_kind,
                measure,
            )?),
        })
    }

    pub fn run(&self, m: &JoinMatrix, job: &JobSpec) -> Result<RunReport, ExecError> {
        let cfg = job.resolve(&self.cfg)?;
        let weight_sets = job.weight_sets()?;
        let started_ms = now_millis();

        let clock = Instant::now();
        let p = self.partitioner(m, job.policy, &cfg)?;
        let init_ms = clock.elapsed().as_millis() as u64;

        let clock = Instant::now();
        let (lower, upper) = p.default_bounds();
        let outcome = find_minimal_threshold(p.as_ref(), lower, upper)?;
        let search_ms = clock.elapsed().as_millis() as u64;
        check(&outcome.partitions, m, cfg.num_partitions);

        let evaluator = MetricsEvaluator::new(m);
        let statistics = evaluator.evaluate(&outcome.partitions);

        let range = if weight_sets.is_empty() {
            None
        } else {
            let base_key = match cfg.cost_kind {
                CostKind::InputCost => "cross_max_input_cost",
                CostKind::CandidateCells => "cross_max_candidate_cells",
            };
            let base = statistics
                .get(base_key)
                .map_or(outcome.threshold, |v| v as u64);
            Some(self.range(p.as_ref(), &cfg, base, &weight_sets)?)
        };

        let finished_ms = now_millis();
        info!(
            policy = %job.policy,
            threshold = outcome.threshold,
            partitions = outcome.partitions.len(),
            probes = outcome.probes,
            "partitioning finished"
        );
        Ok(RunReport {
            engine_version: thetapart_core::VERSION.to_string(),
            matrix_digest: hash_matrix(m),
            policy: job.policy.to_string(),
            cost_kind: cfg.cost_kind,
            num_partitions: cfg.num_partitions,
            lower_bound: lower,
            upper_bound: upper,
            threshold: outcome.threshold,
            partition_count: outcome.partitions.len(),
            probes: outcome.probes,
            mapping_digest: mapping_digest(&outcome.partitions, m)?,
            statistics,
            range,
            started_ms,
            finished_ms,
            init_ms,
            search_ms,
            partitions: outcome.partitions,
        })
    }

    fn range(
        &self,
        p: &dyn Partitioner,
        cfg: &PartitionerConfig,
        base: u64,
        weight_sets: &[Weights],
    ) -> Result<RangeReport, ExecError> {
        let m = p.matrix();
        let clock = Instant::now();
        let upper = ((base as f64) * cfg.range_upper_factor).ceil() as u64;
        let upper = upper.max(base);
        let samples = range_search(p, base, upper, cfg.range_granularity)?;
        let normalized = normalize(&samples);
        let mut probes = samples.len() as u32;

        let evaluator = MetricsEvaluator::new(m);
        let mut selections = Vec::with_capacity(weight_sets.len());
        for weights in weight_sets {
            let mut ranked = samples.clone();
            let best = best_by_weighted_score(&mut ranked, weights)?;
            probes += 1;
            // Re-run at the sampled threshold, not at its measured max cost:
            // feasibility is not monotone, so only the sample is reproducible.
            let set = p
                .feasible(best.threshold)
                .ok_or(PartitioningError::InfeasibleBudget {
                    partitions: cfg.num_partitions,
                    threshold: best.threshold,
                })?;
            check(&set, m, cfg.num_partitions);
            info!(weights = %weights, threshold = best.threshold, score = best.score, "selected sample");
            selections.push(Selection {
                weights: weights.to_string(),
                threshold: best.threshold,
                score: best.score,
                partition_count: set.len(),
                mapping_digest: mapping_digest(&set, m)?,
                statistics: evaluator.evaluate(&set),
                ranked,
                partitions: set,
            });
        }
        Ok(RangeReport {
            lower: base,
            upper,
            probes,
            range_ms: clock.elapsed().as_millis() as u64,
            samples,
            normalized,
            selections,
        })
    }
}

pub(crate) fn mapping_digest(set: &PartitionSet, m: &JoinMatrix) -> Result<Hash256, ExecError> {
    Ok(hash_serde(&set.bucket_mapping(m))?)
}

#[cfg(debug_assertions)]
fn check(set: &PartitionSet, m: &JoinMatrix, budget: usize) {
    thetapart_search::verify::assert_valid(set, m, budget);
}

#[cfg(not(debug_assertions))]
fn check(_set: &PartitionSet, _m: &JoinMatrix, _budget: usize) {}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
