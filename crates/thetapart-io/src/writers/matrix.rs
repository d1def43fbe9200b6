//! Writers for the matrix directory files.

use std::io::Write;

use thetapart_core::matrix::{JoinMatrix, Relation};

use super::csv_writer;
use crate::error::Result;
use crate::readers::properties::Properties;

pub fn write_grid<W: Write>(w: W, m: &JoinMatrix) -> Result<()> {
    let mut out = csv_writer(w);
    for i in 0..m.buckets_s() {
        out.write_record(m.row(i).iter().map(u64::to_string))?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_boundaries<W: Write>(w: W, m: &JoinMatrix) -> Result<()> {
    let mut out = csv_writer(w);
    for (rel, bounds) in [(Relation::S, m.bounds_s()), (Relation::T, m.bounds_t())] {
        for b in bounds {
            out.write_record([rel.to_string(), b.from.to_string(), b.to.to_string()])?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_counts<W: Write>(w: W, m: &JoinMatrix) -> Result<()> {
    let mut out = csv_writer(w);
    for (rel, counts) in [(Relation::S, m.counts_s()), (Relation::T, m.counts_t())] {
        for (i, c) in counts.iter().enumerate() {
            out.write_record([rel.to_string(), i.to_string(), c.to_string()])?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Sizes and bucket counts derived from the matrix.
pub fn matrix_properties(m: &JoinMatrix) -> Properties {
    let mut p = Properties::new("properties.csv");
    p.insert("sizeS", m.size_s());
    p.insert("sizeT", m.size_t());
    p.insert("bucketsS", m.buckets_s());
    p.insert("bucketsT", m.buckets_t());
    if m.buckets_s() == m.buckets_t() {
        p.insert("buckets", m.buckets_s());
    }
    p.insert("candidateCells", m.candidate_cell_count());
    p
}

pub fn write_properties<W: Write>(w: W, props: &Properties) -> Result<()> {
    let mut out = csv_writer(w);
    for (k, v) in props.iter() {
        out.write_record([k, v])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_row_major_csv() {
        let m = JoinMatrix::with_unit_bounds(vec![vec![0, 7], vec![3, 0]], vec![1, 2], vec![3, 4])
            .unwrap();
        let mut buf = Vec::new();
        write_grid(&mut buf, &m).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0,7\n3,0\n");

        let mut buf = Vec::new();
        write_counts(&mut buf, &m).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "S,0,1\nS,1,2\nT,0,3\nT,1,4\n");
    }

    #[test]
    fn properties_are_sorted() {
        let m = JoinMatrix::with_unit_bounds(vec![vec![1]], vec![2], vec![5]).unwrap();
        let mut buf = Vec::new();
        write_properties(&mut buf, &matrix_properties(&m)).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "buckets,1\nbucketsS,1\nbucketsT,1\ncandidateCells,1\nsizeS,2\nsizeT,5\n"
        );
    }
}
