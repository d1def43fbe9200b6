//! Shared fixtures and strategies for integration tests.
#![allow(dead_code)]

use proptest::prelude::*;
use thetapart_core::matrix::JoinMatrix;

/// The 4×4 matrix of the rectangular-cover walkthrough.
pub fn walkthrough(count: u64) -> JoinMatrix {
    JoinMatrix::with_unit_bounds(
        vec![
            vec![0, 0, 0, 0],
            vec![9, 0, 9, 0],
            vec![9, 5, 9, 0],
            vec![1, 0, 9, 0],
        ],
        vec![count; 4],
        vec![count; 4],
    )
    .unwrap()
}

pub fn ones(n: usize) -> JoinMatrix {
    JoinMatrix::with_unit_bounds(vec![vec![1; n]; n], vec![1; n], vec![1; n]).unwrap()
}

/// Band around the diagonal, like a `|s - t| <= width` join.
pub fn band(n: usize, width: usize, count: u64) -> JoinMatrix {
    let rows = (0..n)
        .map(|i| (0..n).map(|j| u64::from(i.abs_diff(j) <= width)).collect())
        .collect();
    JoinMatrix::with_unit_bounds(rows, vec![count; n], vec![count; n]).unwrap()
}

/// Small matrices with at least one candidate cell and counts in `1..=4`.
pub fn small_matrix() -> impl Strategy<Value = JoinMatrix> {
    (1usize..=5, 1usize..=5)
        .prop_flat_map(|(s, t)| {
            (
                prop::collection::vec(prop::collection::vec(0u64..=3, t), s),
                prop::collection::vec(1u64..=4, s),
                prop::collection::vec(1u64..=4, t),
            )
        })
        .prop_filter("needs a candidate cell", |(rows, _, _)| {
            rows.iter().flatten().any(|&c| c > 0)
        })
        .prop_map(|(rows, cs, ct)| JoinMatrix::with_unit_bounds(rows, cs, ct).unwrap())
}
