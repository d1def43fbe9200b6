//! Properties every partitioner and the search must uphold on arbitrary
//! small matrices.

mod common;

use std::collections::BTreeSet;

use common::small_matrix;
use proptest::prelude::*;
use thetapart_core::id::PartitionId;
use thetapart_core::matrix::{CandidateCell, JoinMatrix};
use thetapart_core::partition::{CostKind, FreeformPartition, Partition, PartitionShape};
use thetapart_search::verify::assert_valid;
use thetapart_search::{
    find_minimal_threshold, ClusterMergePartitioner, DistanceMeasure, Partitioner,
    RectangularCoverPartitioner,
};

fn cost_kind() -> impl Strategy<Value = CostKind> {
    prop_oneof![Just(CostKind::InputCost), Just(CostKind::CandidateCells)]
}

fn measure() -> impl Strategy<Value = DistanceMeasure> {
    prop_oneof![
        Just(DistanceMeasure::JaccardBuckets),
        Just(DistanceMeasure::Manhattan),
        Just(DistanceMeasure::AddedInputCostPartitionMax),
        Just(DistanceMeasure::AddedCandidateCellsPartitionMax),
        Just(DistanceMeasure::AddedInputCostPartitionSum),
        Just(DistanceMeasure::EmptiestPartitionInputCost),
        Just(DistanceMeasure::EmptiestPartitionCandidateCells),
        (0u8..=3, 0u8..=3).prop_map(|(r, c)| DistanceMeasure::WeightedInputCostRowsColumns {
            w_rows: f64::from(r),
            w_cols: f64::from(c),
        }),
    ]
}

/// Cost of covering every candidate cell with one partition.
fn whole_cost(m: &JoinMatrix, kind: CostKind) -> u64 {
    let mut all = FreeformPartition::new(PartitionId::new(0));
    for c in m.candidate_cells() {
        all.add_cell(c);
    }
    all.cost(kind, m)
}

fn check_search<P: Partitioner>(p: &P) -> Result<(), TestCaseError> {
    let m = p.matrix();
    let (lower, upper) = p.default_bounds();
    prop_assert!(lower <= upper);
    let outcome = find_minimal_threshold(p, lower, upper)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;
    assert_valid(&outcome.partitions, m, p.num_partitions());
    // Minimal in the binary-search sense.
    let t = outcome.threshold;
    prop_assert!(t == lower || p.feasible(t - 1).is_none());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rect_search_result_is_valid(m in small_matrix(), budget in 1usize..=4, kind in cost_kind()) {
        let p = RectangularCoverPartitioner::new(&m, budget, kind).unwrap();
        check_search(&p)?;
    }

    #[test]
    fn cluster_search_result_is_valid(
        m in small_matrix(),
        budget in 1usize..=4,
        kind in cost_kind(),
        measure in measure(),
    ) {
        let p = ClusterMergePartitioner::new(&m, budget, kind, measure).unwrap();
        check_search(&p)?;
    }

    #[test]
    fn single_partition_feasibility_is_monotone(
        m in small_matrix(),
        kind in cost_kind(),
        measure in measure(),
    ) {
        let whole = whole_cost(&m, kind);
        let rect = RectangularCoverPartitioner::new(&m, 1, kind).unwrap();
        let cluster = ClusterMergePartitioner::new(&m, 1, kind, measure).unwrap();
        for t in 0..=whole + 2 {
            let expect = t >= whole;
            prop_assert_eq!(rect.feasible(t).is_some(), expect, "rect at {}", t);
            prop_assert_eq!(cluster.feasible(t).is_some(), expect, "cluster at {}", t);
        }
    }

    #[test]
    fn every_feasible_threshold_is_valid_for_any_budget(
        m in small_matrix(),
        budget in 2usize..=4,
        kind in cost_kind(),
        measure in measure(),
    ) {
        let whole = whole_cost(&m, kind);
        let rect = RectangularCoverPartitioner::new(&m, budget, kind).unwrap();
        let cluster = ClusterMergePartitioner::new(&m, budget, kind, measure).unwrap();
        for t in 0..=whole {
            if let Some(set) = rect.feasible(t) {
                assert_valid(&set, &m, budget);
            }
            if let Some(set) = cluster.feasible(t) {
                assert_valid(&set, &m, budget);
            }
        }
        // A single partition holding everything always fits at `whole`.
        prop_assert!(rect.feasible(whole).is_some());
        prop_assert!(cluster.feasible(whole).is_some());
    }

    #[test]
    fn rect_upper_bound_is_one_rectangle(m in small_matrix(), budget in 1usize..=4, kind in cost_kind()) {
        let p = RectangularCoverPartitioner::new(&m, budget, kind).unwrap();
        let set = p.feasible(p.default_bounds().1).unwrap();
        prop_assert_eq!(set.len(), 1);
        let is_rect = matches!(set.partitions()[0], PartitionShape::Rectangular(_));
        prop_assert!(is_rect);
        prop_assert!(set.covers_exactly(&m));
    }

    #[test]
    fn memoized_input_cost_matches_recomputation(
        m in small_matrix(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..8),
    ) {
        let cells: Vec<CandidateCell> = m.candidate_cells().collect();
        let mut p = FreeformPartition::new(PartitionId::new(0));
        for pick in picks {
            p.add_cell(*pick.get(&cells));
            prop_assert!(p.cells_state().is_cost_stale());
            let first = p.input_cost(&m);
            prop_assert!(!p.cells_state().is_cost_stale());
            prop_assert_eq!(p.input_cost(&m), first);

            let rows: BTreeSet<usize> = p.cells().iter().map(|c| c.row).collect();
            let cols: BTreeSet<usize> = p.cells().iter().map(|c| c.col).collect();
            let fresh: u64 = rows.iter().map(|&i| m.counts_s()[i]).sum::<u64>()
                + cols.iter().map(|&j| m.counts_t()[j]).sum::<u64>();
            prop_assert_eq!(first, fresh);
        }
    }

    #[test]
    fn merged_cost_preview_matches_merge(m in small_matrix(), split in any::<prop::sample::Index>()) {
        let cells: Vec<CandidateCell> = m.candidate_cells().collect();
        let at = split.index(cells.len());
        let mut a = FreeformPartition::new(PartitionId::new(0));
        let mut b = FreeformPartition::new(PartitionId::new(1));
        for (i, c) in cells.iter().enumerate() {
            if i <= at { a.add_cell(*c) } else { b.add_cell(*c) }
        }
        let preview = a.merged_input_cost(&b, &m);
        let count = a.merged_cell_count(&b);
        a.merge(&b);
        prop_assert_eq!(a.input_cost(&m), preview);
        prop_assert_eq!(a.candidate_cell_count(), count);
        prop_assert_eq!(count, m.candidate_cell_count());
    }
}
