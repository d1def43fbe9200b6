//! Debug-time verification helpers for partition sets.
//!
//! These functions are intended for testing and debug builds to catch
//! violations early (over-threshold partitions, blown budgets, lost cells).

use std::collections::BTreeSet;

use thetapart_core::matrix::JoinMatrix;
use thetapart_core::partition::{CostKind, Partition, PartitionSet};

/// Every partition's cost of `kind` is at most `threshold`.
pub fn assert_cost_respected(set: &PartitionSet, m: &JoinMatrix, kind: CostKind, threshold: u64) {
    for p in set.iter() {
        let cost = p.cost(kind, m);
        assert!(
            cost <= threshold,
            "partition {} has {kind} {cost} > threshold {threshold}",
            p.id()
        );
    }
}

/// No more than `budget` partitions.
pub fn assert_within_budget(set: &PartitionSet, budget: usize) {
    assert!(
        set.len() <= budget,
        "{} partitions exceed budget {budget}",
        set.len()
    );
}

/// Each candidate cell belongs to exactly one partition, and ids are dense.
pub fn assert_exact_cover(set: &PartitionSet, m: &JoinMatrix) {
    let mut seen = BTreeSet::new();
    for (i, p) in set.iter().enumerate() {
        assert_eq!(p.id().index(), i, "partition ids are not dense");
        for c in p.cells() {
            assert!(
                m.is_candidate(c.row, c.col),
                "partition {} holds non-candidate cell ({}, {})",
                p.id(),
                c.row,
                c.col
            );
            assert!(seen.insert(*c), "cell ({}, {}) assigned twice", c.row, c.col);
        }
    }
    assert_eq!(
        seen.len() as u64,
        m.candidate_cell_count(),
        "not every candidate cell is covered"
    );
}

/// All three checks for a probe result.
pub fn assert_valid(set: &PartitionSet, m: &JoinMatrix, budget: usize) {
    assert_cost_respected(set, m, set.cost_kind(), set.threshold());
    assert_within_budget(set, budget);
    assert_exact_cover(set, m);
}
