//! Worked examples for the partitioners and the threshold search.

mod common;

use common::{ones, walkthrough};
use thetapart_core::metrics::MetricsEvaluator;
use thetapart_core::partition::{CostKind, Partition, PartitionShape};
use thetapart_search::verify::assert_valid;
use thetapart_search::{
    best_by_weighted_score, find_minimal_threshold, range_search, sample_thresholds,
    ClusterMergePartitioner, DistanceMeasure, Partitioner, RectangularCoverPartitioner, Weights,
};

fn spans(set: &thetapart_core::partition::PartitionSet) -> Vec<(usize, usize, usize, usize)> {
    set.iter()
        .map(|p| match p {
            PartitionShape::Rectangular(r) => {
                let s = r.span().unwrap();
                (s.row_start, s.row_end, s.col_start, s.col_end)
            }
            PartitionShape::Freeform(_) => panic!("expected rectangles"),
        })
        .collect()
}

#[test]
fn walkthrough_candidate_cells_fit_four() {
    let m = walkthrough(1);
    let p = RectangularCoverPartitioner::new(&m, 2, CostKind::CandidateCells).unwrap();
    let set = p.feasible(4).expect("threshold 4 is feasible");
    assert_valid(&set, &m, 2);
    // The empty first row is absorbed into the band.
    assert_eq!(spans(&set), vec![(0, 3, 0, 1), (0, 3, 2, 3)]);
    let cells: Vec<u64> = set.iter().map(|r| r.candidate_cell_count()).collect();
    assert_eq!(cells, vec![4, 3]);
}

#[test]
fn walkthrough_input_cost_needs_five() {
    let m = walkthrough(1);
    let p = RectangularCoverPartitioner::new(&m, 2, CostKind::InputCost).unwrap();
    // Every band the greedy sweep tries either needs a third rectangle or
    // leaves one above 4.
    assert!(p.feasible(4).is_none());

    let set = p.feasible(5).unwrap();
    assert_valid(&set, &m, 2);
    assert_eq!(spans(&set), vec![(0, 2, 0, 3), (3, 3, 0, 3)]);
    assert_eq!(set.input_costs(&m).iter().map(|(_, c)| *c).collect::<Vec<_>>(), vec![5, 3]);

    let (lower, upper) = p.default_bounds();
    assert_eq!((lower, upper), (3, 8));
    let outcome = find_minimal_threshold(&p, lower, upper).unwrap();
    assert_eq!(outcome.threshold, 5);
}

#[test]
fn walkthrough_binary_search_candidate_cells() {
    let m = walkthrough(1);
    let p = RectangularCoverPartitioner::new(&m, 2, CostKind::CandidateCells).unwrap();
    let (lower, upper) = p.default_bounds();
    assert_eq!((lower, upper), (3, 7));
    let outcome = find_minimal_threshold(&p, lower, upper).unwrap();
    assert_eq!(outcome.threshold, 4);
    assert_eq!(outcome.partitions.len(), 2);
}

#[test]
fn all_ones_merges_into_one_partition_for_every_measure() {
    let m = ones(3);
    let measures = [
        DistanceMeasure::JaccardBuckets,
        DistanceMeasure::Manhattan,
        DistanceMeasure::AddedInputCostPartitionMax,
        DistanceMeasure::AddedCandidateCellsPartitionMax,
        DistanceMeasure::AddedInputCostPartitionSum,
        DistanceMeasure::EmptiestPartitionInputCost,
        DistanceMeasure::EmptiestPartitionCandidateCells,
        DistanceMeasure::WeightedInputCostRowsColumns {
            w_rows: 1.0,
            w_cols: 2.0,
        },
    ];
    for measure in measures {
        let p = ClusterMergePartitioner::new(&m, 1, CostKind::InputCost, measure).unwrap();
        let (lower, upper) = p.default_bounds();
        let outcome = find_minimal_threshold(&p, lower, upper).unwrap();
        assert_eq!(outcome.partitions.len(), 1, "{measure}");
        let only = &outcome.partitions.partitions()[0];
        assert_eq!(only.cells().len(), 9, "{measure}");
        assert_eq!(only.input_cost(&m), m.size_s() + m.size_t(), "{measure}");
        assert_eq!(outcome.threshold, 6, "{measure}");
    }
}

#[test]
fn range_samples_from_most_permissive_down() {
    assert_eq!(sample_thresholds(10, 100, 3), vec![100, 55, 10]);

    let m = walkthrough(10);
    let p = RectangularCoverPartitioner::new(&m, 2, CostKind::InputCost).unwrap();
    let scores = range_search(&p, 10, 100, 3).unwrap();
    // 10 cannot hold a single row plus its columns, so sampling stops there.
    let thresholds: Vec<u64> = scores.iter().map(|s| s.threshold).collect();
    assert_eq!(thresholds, vec![100, 55]);
    assert_eq!(scores[0].get("cross_max_input_cost"), Some(60.0));
    assert_eq!(scores[1].get("cross_max_input_cost"), Some(50.0));
}

#[test]
fn weighted_pick_prefers_lower_max_cost() {
    let m = walkthrough(10);
    let p = RectangularCoverPartitioner::new(&m, 2, CostKind::InputCost).unwrap();
    let mut scores = range_search(&p, 10, 100, 3).unwrap();
    let weights: Weights = "cross_max_input_cost=1".parse().unwrap();
    let best = best_by_weighted_score(&mut scores, &weights).unwrap();
    assert_eq!(best.threshold, 55);
    assert_eq!(scores[0].threshold, 55);

    let set = p.feasible(best.threshold).unwrap();
    let again = MetricsEvaluator::new(&m).evaluate(&set);
    assert_eq!(again.get("cross_max_input_cost"), Some(50.0));
}

// With more than one partition a lower threshold can succeed where a higher
// one fails, so the search result is only minimal against its neighbour.
#[test]
fn rect_feasibility_has_gaps_above_one_partition() {
    let m = thetapart_core::matrix::JoinMatrix::with_unit_bounds(
        vec![
            vec![0, 3, 0, 2],
            vec![3, 1, 2, 0],
            vec![1, 1, 0, 3],
            vec![1, 2, 0, 2],
        ],
        vec![3, 2, 3, 1],
        vec![4, 4, 2, 3],
    )
    .unwrap();
    let p = RectangularCoverPartitioner::new(&m, 4, CostKind::InputCost).unwrap();

    let at_11 = p.feasible(11).expect("threshold 11 is feasible");
    assert_valid(&at_11, &m, 4);
    assert_eq!(spans(&at_11), vec![(0, 0, 0, 3), (1, 3, 0, 0), (1, 3, 1, 1), (1, 3, 2, 3)]);
    assert!(p.feasible(12).is_none());
    assert!(p.feasible(13).is_some());

    let (lower, upper) = p.default_bounds();
    assert_eq!((lower, upper), (3, 22));
    let outcome = find_minimal_threshold(&p, lower, upper).unwrap();
    assert_eq!(outcome.threshold, 13);
    assert_valid(&outcome.partitions, &m, 4);
}

#[test]
fn cluster_feasibility_has_gaps_above_one_partition() {
    let m = thetapart_core::matrix::JoinMatrix::with_unit_bounds(
        vec![
            vec![2, 0, 0, 1, 0],
            vec![3, 0, 1, 1, 3],
            vec![2, 3, 1, 0, 1],
            vec![2, 1, 0, 3, 0],
        ],
        vec![2, 3, 2, 1],
        vec![4, 1, 4, 2, 1],
    )
    .unwrap();
    let p = ClusterMergePartitioner::new(&m, 4, CostKind::InputCost, DistanceMeasure::JaccardBuckets)
        .unwrap();

    assert!(p.feasible(11).is_none());
    let below: Vec<u64> = (0..11).filter(|&t| p.feasible(t).is_some()).collect();
    assert!(!below.is_empty());
    for t in below {
        assert_valid(&p.feasible(t).unwrap(), &m, 4);
    }

    let (lower, upper) = p.default_bounds();
    let outcome = find_minimal_threshold(&p, lower, upper).unwrap();
    assert_valid(&outcome.partitions, &m, 4);
    let t = outcome.threshold;
    assert!(t == lower || p.feasible(t - 1).is_none());
}
