//! CSV readers for the matrix directory and partitioning outputs.
//!
//! Every reader takes any `Read`; the `*_path` helpers open files. Files have
//! no header row; whitespace around fields is ignored.

pub mod histogram;
pub mod matrix;
pub mod partitioning;
pub mod properties;

use std::io::Read;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{Error, Result};

pub(crate) fn csv_reader<R: Read>(r: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(r)
}

pub(crate) fn line_of(rec: &StringRecord) -> u64 {
    rec.position().map_or(0, |p| p.line())
}

/// Parse field `idx` of `rec`, naming the file and line on failure.
pub(crate) fn field<T: FromStr>(rec: &StringRecord, idx: usize, file: &str) -> Result<T> {
    let raw = rec
        .get(idx)
        .ok_or_else(|| Error::parse(file, line_of(rec), format!("missing field {idx}")))?;
    raw.parse::<T>()
        .map_err(|_| Error::parse(file, line_of(rec), format!("bad value '{raw}' in field {idx}")))
}

pub(crate) fn is_blank(rec: &StringRecord) -> bool {
    rec.iter().all(str::is_empty)
}
