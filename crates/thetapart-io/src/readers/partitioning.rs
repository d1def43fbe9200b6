//! Readers for exported partitioning outputs, as consumed by join workers.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use thetapart_core::id::PartitionId;
use thetapart_core::matrix::Relation;
use thetapart_core::partition::BucketMapping;

use super::{csv_reader, field, is_blank, line_of};
use crate::error::{Error, Result};

/// `S|T,bucket,p1,p2,...`. Buckets that never appear map to no partition.
pub fn read_bucket_mapping<R: Read>(
    r: R,
    file: &str,
    buckets_s: usize,
    buckets_t: usize,
) -> Result<BucketMapping> {
    let mut mapping = BucketMapping {
        s: vec![BTreeSet::new(); buckets_s],
        t: vec![BTreeSet::new(); buckets_t],
    };
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        let rel: Relation = rec
            .get(0)
            .unwrap_or_default()
            .parse()
            .map_err(|e: thetapart_core::error::PartitioningError| {
                Error::parse(file, line_of(&rec), e.to_string())
            })?;
        let idx: usize = field(&rec, 1, file)?;
        let target = match rel {
            Relation::S => &mut mapping.s,
            Relation::T => &mut mapping.t,
        };
        let slot = target.get_mut(idx).ok_or_else(|| {
            Error::parse(file, line_of(&rec), format!("{rel} bucket {idx} out of range"))
        })?;
        for i in 2..rec.len() {
            if rec.get(i).is_some_and(str::is_empty) {
                continue;
            }
            slot.insert(PartitionId::new(field::<u32>(&rec, i, file)?));
        }
    }
    Ok(mapping)
}

pub fn read_bucket_mapping_path(path: &Path, buckets_s: usize, buckets_t: usize) -> Result<BucketMapping> {
    read_bucket_mapping(File::open(path)?, &path.display().to_string(), buckets_s, buckets_t)
}

/// `id,cost` lines.
pub fn read_input_costs<R: Read>(r: R, file: &str) -> Result<Vec<(PartitionId, u64)>> {
    let mut out = Vec::new();
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        out.push((PartitionId::new(field(&rec, 0, file)?), field(&rec, 1, file)?));
    }
    Ok(out)
}
