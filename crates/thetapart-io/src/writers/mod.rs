//! CSV writers mirroring the readers, plus the partitioning exporter.

pub mod matrix;
pub mod partitioning;

use std::io::Write;

pub(crate) fn csv_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(w)
}
