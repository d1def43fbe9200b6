//! The join matrix: a `buckets_s × buckets_t` grid of pre-aggregated costs.
//!
//! A cell `(i, j)` is a *candidate* iff its cost is non-zero, i.e. some value
//! in bucket `i` of S may satisfy the predicate against some value in bucket
//! `j` of T. Bucket order matters to the rectangular partitioner and is
//! irrelevant to the cluster partitioner.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{PartitioningError, Result};

/// Inclusive value range represented by one histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketBounds {
    pub from: i64,
    pub to: i64,
}

impl BucketBounds {
    pub const fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

/// Coordinates of one candidate cell. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateCell {
    pub row: usize,
    pub col: usize,
}

impl CandidateCell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Relation selector used by the histogram records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    S,
    T,
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Relation::S => f.write_str("S"),
            Relation::T => f.write_str("T"),
        }
    }
}

impl std::str::FromStr for Relation {
    type Err = PartitioningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "S" | "s" => Ok(Relation::S),
            "T" | "t" => Ok(Relation::T),
            other => Err(PartitioningError::MalformedInput(format!(
                "unknown relation '{other}' (expected S or T)"
            ))),
        }
    }
}

/// Immutable join matrix with per-bucket bounds and cardinalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinMatrix {
    buckets_s: usize,
    buckets_t: usize,
    /// Row-major, `buckets_s * buckets_t`.
    cells: Vec<u64>,
    bounds_s: Vec<BucketBounds>,
    bounds_t: Vec<BucketBounds>,
    counts_s: Vec<u64>,
    counts_t: Vec<u64>,
    size_s: u64,
    size_t: u64,
    total_size: u64,
    candidates: u64,
}

impl JoinMatrix {
    /// Build and validate a matrix. Every inconsistency is reported here,
    /// never later during a search.
    pub fn new(
        rows: Vec<Vec<u64>>,
        bounds_s: Vec<BucketBounds>,
        bounds_t: Vec<BucketBounds>,
        counts_s: Vec<u64>,
        counts_t: Vec<u64>,
    ) -> Result<Self> {
        let buckets_s = rows.len();
        if buckets_s == 0 {
            return Err(malformed("matrix has no rows"));
        }
        let buckets_t = rows[0].len();
        if buckets_t == 0 {
            return Err(malformed("matrix has no columns"));
        }

        let mut cells = Vec::with_capacity(buckets_s * buckets_t);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != buckets_t {
                return Err(malformed(format!(
                    "row {i} has {} columns, expected {buckets_t}",
                    row.len()
                )));
            }
            cells.extend(row);
        }

        check_len("S counts", counts_s.len(), buckets_s)?;
        check_len("T counts", counts_t.len(), buckets_t)?;
        check_len("S boundaries", bounds_s.len(), buckets_s)?;
        check_len("T boundaries", bounds_t.len(), buckets_t)?;
        check_bounds(Relation::S, &bounds_s)?;
        check_bounds(Relation::T, &bounds_t)?;

        let size_s = checked_sum(&counts_s)?;
        let size_t = checked_sum(&counts_t)?;
        let total_size = size_s
            .checked_add(size_t)
            .ok_or_else(|| malformed("combined S and T sizes overflow u64"))?;
        let candidates = cells.iter().filter(|&&c| c > 0).count() as u64;

        Ok(Self {
            buckets_s,
            buckets_t,
            cells,
            bounds_s,
            bounds_t,
            counts_s,
            counts_t,
            size_s,
            size_t,
            total_size,
            candidates,
        })
    }

    /// Build a matrix whose bucket `i` covers exactly the value `i`.
    /// Useful when no histogram exists (tests, synthetic matrices).
    pub fn with_unit_bounds(
        rows: Vec<Vec<u64>>,
        counts_s: Vec<u64>,
        counts_t: Vec<u64>,
    ) -> Result<Self> {
        let bounds_s = unit_bounds(counts_s.len());
        let bounds_t = unit_bounds(counts_t.len());
        Self::new(rows, bounds_s, bounds_t, counts_s, counts_t)
    }

    pub fn buckets_s(&self) -> usize {
        self.buckets_s
    }

    pub fn buckets_t(&self) -> usize {
        self.buckets_t
    }

    #[inline]
    pub fn cost(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.buckets_t + col]
    }

    #[inline]
    pub fn is_candidate(&self, row: usize, col: usize) -> bool {
        self.cost(row, col) > 0
    }

    pub fn row(&self, row: usize) -> &[u64] {
        let start = row * self.buckets_t;
        &self.cells[start..start + self.buckets_t]
    }

    pub fn counts_s(&self) -> &[u64] {
        &self.counts_s
    }

    pub fn counts_t(&self) -> &[u64] {
        &self.counts_t
    }

    pub fn bounds_s(&self) -> &[BucketBounds] {
        &self.bounds_s
    }

    pub fn bounds_t(&self) -> &[BucketBounds] {
        &self.bounds_t
    }

    pub fn size_s(&self) -> u64 {
        self.size_s
    }

    pub fn size_t(&self) -> u64 {
        self.size_t
    }

    /// `size_s + size_t`: the input cost of a single partition holding everything.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn candidate_cell_count(&self) -> u64 {
        self.candidates
    }

    /// Candidate cells in row-major order.
    pub fn candidate_cells(&self) -> impl Iterator<Item = CandidateCell> + '_ {
        let bt = self.buckets_t;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(move |(idx, _)| CandidateCell::new(idx / bt, idx % bt))
    }

    /// Number of candidate cells in the row band `rows`, across all columns.
    pub fn candidate_cells_in_rows(&self, rows: RangeInclusive<usize>) -> u64 {
        rows.map(|i| self.row(i).iter().filter(|&&c| c > 0).count() as u64)
            .sum()
    }

    /// Estimated result tuples produced by a cell: `count_s[i] * count_t[j]`.
    pub fn output_weight(&self, row: usize, col: usize) -> u64 {
        self.counts_s[row].saturating_mul(self.counts_t[col])
    }

    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.cells
            .chunks(self.buckets_t)
            .map(|r| r.to_vec())
            .collect()
    }
}

fn malformed(msg: impl Into<String>) -> PartitioningError {
    PartitioningError::MalformedInput(msg.into())
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(malformed(format!(
            "{what}: got {got} entries, matrix has {expected} buckets"
        )));
    }
    Ok(())
}

fn check_bounds(rel: Relation, bounds: &[BucketBounds]) -> Result<()> {
    for (i, b) in bounds.iter().enumerate() {
        if b.from > b.to {
            return Err(malformed(format!(
                "{rel} bucket {i}: from {} > to {}",
                b.from, b.to
            )));
        }
        if i > 0 && bounds[i - 1].to >= b.from {
            return Err(malformed(format!(
                "{rel} bucket {i} overlaps or precedes bucket {}",
                i - 1
            )));
        }
    }
    Ok(())
}

fn checked_sum(counts: &[u64]) -> Result<u64> {
    counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or_else(|| malformed("bucket counts overflow u64"))
}

fn unit_bounds(n: usize) -> Vec<BucketBounds> {
    (0..n as i64).map(|i| BucketBounds::new(i, i)).collect()
}
