//! Replay and consistency checks.
//!
//! `replay` re-runs a job and compares placement digests with an earlier
//! report. `check_mapping` audits an exported bucket mapping the way a join
//! worker would consume it: every candidate cell must be reachable by some
//! partition holding both buckets, and recorded input costs must match the
//! buckets each partition reads.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use thetapart_core::id::PartitionId;
use thetapart_core::matrix::{CandidateCell, JoinMatrix};
use thetapart_core::partition::BucketMapping;
use thetapart_io::export::{INPUT_COST_FILE, MAPPING_FILE};
use thetapart_io::readers::partitioning::{read_bucket_mapping_path, read_input_costs};

use crate::job::JobSpec;
use crate::report::RunReport;
use crate::runtime::{Engine, ExecError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostMismatch {
    pub partition: PartitionId,
    pub recorded: u64,
    pub actual: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingCheck {
    pub partitions: usize,
    pub max_input_cost: u64,
    /// Candidate cells whose S and T buckets share no partition.
    pub uncovered: Vec<CandidateCell>,
    pub cost_mismatches: Vec<CostMismatch>,
    /// Partitions with a recorded cost but no bucket, or the reverse.
    pub unknown_partitions: Vec<PartitionId>,
}

impl MappingCheck {
    pub fn is_ok(&self) -> bool {
        self.uncovered.is_empty()
            && self.cost_mismatches.is_empty()
            && self.unknown_partitions.is_empty()
    }
}

/// Input cost per partition as implied by the mapping.
pub fn mapped_input_costs(m: &JoinMatrix, mapping: &BucketMapping) -> BTreeMap<PartitionId, u64> {
    let mut costs = BTreeMap::new();
    for (counts, buckets) in [(m.counts_s(), &mapping.s), (m.counts_t(), &mapping.t)] {
        for (idx, ids) in buckets.iter().enumerate() {
            let count = counts.get(idx).copied().unwrap_or(0);
            for id in ids {
                *costs.entry(*id).or_insert(0) += count;
            }
        }
    }
    costs
}

pub fn check_mapping(
    m: &JoinMatrix,
    mapping: &BucketMapping,
    recorded: &[(PartitionId, u64)],
) -> MappingCheck {
    let uncovered = m
        .candidate_cells()
        .filter(|c| match (mapping.s.get(c.row), mapping.t.get(c.col)) {
            (Some(s), Some(t)) => s.is_disjoint(t),
            _ => true,
        })
        .collect();

    let actual = mapped_input_costs(m, mapping);
    let mut cost_mismatches = Vec::new();
    let mut unknown_partitions = Vec::new();
    for &(id, cost) in recorded {
        match actual.get(&id) {
            Some(&a) if a != cost => cost_mismatches.push(CostMismatch {
                partition: id,
                recorded: cost,
                actual: a,
            }),
            Some(_) => {}
            None => unknown_partitions.push(id),
        }
    }
    for id in actual.keys() {
        if !recorded.iter().any(|(r, _)| r == id) {
            unknown_partitions.push(*id);
        }
    }

    MappingCheck {
        partitions: actual.len(),
        max_input_cost: actual.values().copied().max().unwrap_or(0),
        uncovered,
        cost_mismatches,
        unknown_partitions,
    }
}

/// Read `histogramIndexToPartitionsMapping.csv` and `partitionsInputCost.csv`
/// from `dir` and check them against `m`.
pub fn check_partitioning_dir(m: &JoinMatrix, dir: &Path) -> Result<MappingCheck, ExecError> {
    let mapping = read_bucket_mapping_path(&dir.join(MAPPING_FILE), m.buckets_s(), m.buckets_t())?;
    let costs_path = dir.join(INPUT_COST_FILE);
    let file = std::fs::File::open(&costs_path).map_err(thetapart_io::Error::from)?;
    let recorded = read_input_costs(file, &costs_path.display().to_string())?;
    Ok(check_mapping(m, &mapping, &recorded))
}

/// Re-run `job` and report whether threshold and placement are unchanged.
pub fn replay(
    engine: &Engine,
    m: &JoinMatrix,
    job: &JobSpec,
    previous: &RunReport,
) -> Result<bool, ExecError> {
    let again = engine.run(m, job)?;
    Ok(again.matrix_digest == previous.matrix_digest
        && again.threshold == previous.threshold
        && again.mapping_digest == previous.mapping_digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn fixture() -> JoinMatrix {
        JoinMatrix::with_unit_bounds(vec![vec![1, 0], vec![1, 1]], vec![2, 3], vec![4, 5]).unwrap()
    }

    fn ids(v: &[u32]) -> BTreeSet<PartitionId> {
        v.iter().copied().map(PartitionId::new).collect()
    }

    #[test]
    fn consistent_mapping_passes() {
        let m = fixture();
        let mapping = BucketMapping {
            s: vec![ids(&[0]), ids(&[1])],
            t: vec![ids(&[0, 1]), ids(&[1])],
        };
        let check = check_mapping(&m, &mapping, &[(PartitionId::new(0), 6), (PartitionId::new(1), 12)]);
        assert!(check.is_ok(), "{check:?}");
        assert_eq!(check.partitions, 2);
        assert_eq!(check.max_input_cost, 12);
    }

    #[test]
    fn uncovered_cell_and_wrong_cost_are_reported() {
        let m = fixture();
        let mapping = BucketMapping {
            s: vec![ids(&[0]), ids(&[1])],
            t: vec![ids(&[0]), ids(&[1])],
        };
        let check = check_mapping(&m, &mapping, &[(PartitionId::new(0), 6), (PartitionId::new(1), 9)]);
        assert_eq!(check.uncovered, vec![CandidateCell::new(1, 0)]);
        assert_eq!(
            check.cost_mismatches,
            vec![CostMismatch {
                partition: PartitionId::new(1),
                recorded: 9,
                actual: 8
            }]
        );
        assert!(!check.is_ok());
    }

    #[test]
    fn exported_run_checks_clean_and_replays() {
        let m = fixture();
        let job = JobSpec {
            num_partitions: Some(2),
            ..JobSpec::default()
        };
        let engine = Engine::default();
        let report = engine.run(&m, &job).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        report.export(&m, tmp.path()).unwrap();

        let check = check_partitioning_dir(&m, tmp.path()).unwrap();
        assert!(check.is_ok(), "{check:?}");
        assert_eq!(check.partitions, report.partition_count);
        assert!(replay(&engine, &m, &job, &report).unwrap());
    }
}
