//! Row-major cost grid: one matrix row per line, comma-separated.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{csv_reader, field, is_blank};
use crate::error::Result;

pub fn read_grid<R: Read>(r: R, file: &str) -> Result<Vec<Vec<u64>>> {
    let mut rows = Vec::new();
    for rec in csv_reader(r).records() {
        let rec = rec?;
        if is_blank(&rec) {
            continue;
        }
        let row = (0..rec.len())
            .map(|i| field::<u64>(&rec, i, file))
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_grid_path(path: &Path) -> Result<Vec<Vec<u64>>> {
    read_grid(File::open(path)?, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn reads_rows_and_skips_blank_lines() {
        let text = "0,1, 2\n\n3,4,5\n";
        let rows = read_grid(text.as_bytes(), "pm.csv").unwrap();
        assert_eq!(rows, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn ragged_rows_are_left_to_matrix_validation() {
        let rows = read_grid("1,2\n3\n".as_bytes(), "pm.csv").unwrap();
        assert_eq!(rows[1], vec![3]);
    }

    #[test]
    fn negative_cost_is_a_parse_error() {
        let err = read_grid("1,-2\n".as_bytes(), "pm.csv").unwrap_err();
        match err {
            Error::Parse { file, line, .. } => {
                assert_eq!(file, "pm.csv");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
