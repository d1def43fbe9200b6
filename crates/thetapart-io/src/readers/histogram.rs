//! Bucket boundaries (`S|T,from,to`) and counts (`S|T,index,count`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thetapart_core::error::PartitioningError;
use thetapart_core::matrix::{BucketBounds, Relation};

use super::{csv_reader, field, is_blank, line_of};
use crate::error::{Error, Result};

/// Per-relation values, indexed by bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerRelation<T> {
    pub s: Vec<T>,
    pub t: Vec<T>,
}

// Manual impl: no `T: Default` bound.
impl<T> Default for PerRelation<T> {
    fn default() -> Self {
        Self {
            s: Vec::new(),
            t: Vec::new(),
        }
    }
}

impl<T> PerRelation<T> {
    pub fn get_mut(&mut self, rel: Relation) -> &mut Vec<T> {
        match rel {
            Relation::S => &mut self.s,
            Relation::T => &mut self.t,
        }
    }
}

/// Boundaries are listed in bucket-index order within each relation.
pub fn read_boundaries<R: Read>(r: R, file: &str) -> Result<PerRelation<BucketBounds>> {
    let mut out = PerRelation::default();
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        let rel = relation(&rec, file)?;
        let from: i64 = field(&rec, 1, file)?;
        let to: i64 = field(&rec, 2, file)?;
        out.get_mut(rel).push(BucketBounds::new(from, to));
    }
    Ok(out)
}

/// Counts may come in any order but every index `0..n` must appear once.
pub fn read_counts<R: Read>(r: R, file: &str) -> Result<PerRelation<u64>> {
    let mut raw: PerRelation<(usize, u64)> = PerRelation::default();
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        let rel = relation(&rec, file)?;
        let idx: usize = field(&rec, 1, file)?;
        let count: u64 = field(&rec, 2, file)?;
        raw.get_mut(rel).push((idx, count));
    }
    Ok(PerRelation {
        s: densify(Relation::S, raw.s)?,
        t: densify(Relation::T, raw.t)?,
    })
}

pub fn read_boundaries_path(path: &Path) -> Result<PerRelation<BucketBounds>> {
    read_boundaries(File::open(path)?, &path.display().to_string())
}

pub fn read_counts_path(path: &Path) -> Result<PerRelation<u64>> {
    read_counts(File::open(path)?, &path.display().to_string())
}

fn relation(rec: &csv::StringRecord, file: &str) -> Result<Relation> {
    let raw = rec.get(0).unwrap_or_default();
    raw.parse::<Relation>()
        .map_err(|e| Error::parse(file, line_of(rec), e.to_string()))
}

fn densify(rel: Relation, mut entries: Vec<(usize, u64)>) -> Result<Vec<u64>> {
    entries.sort_by_key(|&(i, _)| i);
    let mut out = Vec::with_capacity(entries.len());
    for (expected, (idx, count)) in entries.into_iter().enumerate() {
        if idx != expected {
            return Err(PartitioningError::MalformedInput(format!(
                "{rel} counts: expected bucket index {expected}, found {idx}"
            ))
            .into());
        }
        out.push(count);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_split_by_relation() {
        let text = "S,0,9\nT,0,4\nS,10,19\nT,5,9\nT,10,30\n";
        let b = read_boundaries(text.as_bytes(), "boundaries.csv").unwrap();
        assert_eq!(b.s, vec![BucketBounds::new(0, 9), BucketBounds::new(10, 19)]);
        assert_eq!(b.t.len(), 3);
    }

    #[test]
    fn empty_boundaries_file_has_no_buckets() {
        let b: PerRelation<BucketBounds> = read_boundaries("".as_bytes(), "boundaries.csv").unwrap();
        assert_eq!(b, PerRelation::default());
        assert!(b.s.is_empty() && b.t.is_empty());
    }

    #[test]
    fn counts_are_reordered_by_index() {
        let text = "S,1,7\nS,0,3\nT,0,2\n";
        let c = read_counts(text.as_bytes(), "counts.csv").unwrap();
        assert_eq!(c.s, vec![3, 7]);
        assert_eq!(c.t, vec![2]);
    }

    #[test]
    fn gaps_and_duplicates_are_malformed() {
        let gap = read_counts("S,0,1\nS,2,1\n".as_bytes(), "counts.csv").unwrap_err();
        assert!(matches!(gap, Error::Core(PartitioningError::MalformedInput(_))));
        let dup = read_counts("S,0,1\nS,0,1\n".as_bytes(), "counts.csv").unwrap_err();
        assert!(matches!(dup, Error::Core(PartitioningError::MalformedInput(_))));
    }

    #[test]
    fn unknown_relation_is_a_parse_error() {
        let err = read_boundaries("R,0,1\n".as_bytes(), "boundaries.csv").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }
}
