//! A matrix directory: `pm.csv`, `boundaries.csv`, `counts.csv`, `properties.csv`.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thetapart_core::error::PartitioningError;
use thetapart_core::matrix::JoinMatrix;

use crate::error::Result;
use crate::readers::histogram::{read_boundaries_path, read_counts_path};
use crate::readers::matrix::read_grid_path;
use crate::readers::properties::{read_properties_path, Properties};
use crate::writers::matrix::{
    matrix_properties, write_boundaries, write_counts, write_grid, write_properties,
};

pub const GRID_FILE: &str = "pm.csv";
pub const BOUNDARIES_FILE: &str = "boundaries.csv";
pub const COUNTS_FILE: &str = "counts.csv";
pub const PROPERTIES_FILE: &str = "properties.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixDir {
    root: PathBuf,
}

impl MatrixDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Load and validate. `properties.csv` is optional; when present its
    /// sizes and bucket counts must agree with the other files.
    pub fn load(&self) -> Result<JoinMatrix> {
        let rows = read_grid_path(&self.path(GRID_FILE))?;
        let bounds = read_boundaries_path(&self.path(BOUNDARIES_FILE))?;
        let counts = read_counts_path(&self.path(COUNTS_FILE))?;
        let m = JoinMatrix::new(rows, bounds.s, bounds.t, counts.s, counts.t)?;

        let props_path = self.path(PROPERTIES_FILE);
        if props_path.exists() {
            check_properties(&read_properties_path(&props_path)?, &m)?;
        }
        Ok(m)
    }

    pub fn save(&self, m: &JoinMatrix) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_grid(BufWriter::new(File::create(self.path(GRID_FILE))?), m)?;
        write_boundaries(BufWriter::new(File::create(self.path(BOUNDARIES_FILE))?), m)?;
        write_counts(BufWriter::new(File::create(self.path(COUNTS_FILE))?), m)?;
        write_properties(
            BufWriter::new(File::create(self.path(PROPERTIES_FILE))?),
            &matrix_properties(m),
        )?;
        Ok(())
    }
}

fn check_properties(props: &Properties, m: &JoinMatrix) -> Result<()> {
    let expect = |key: &str, actual: u64| -> Result<()> {
        match props.get_parsed::<u64>(key)? {
            Some(v) if v != actual => Err(PartitioningError::MalformedInput(format!(
                "property {key}={v} disagrees with the matrix ({actual})"
            ))
            .into()),
            _ => Ok(()),
        }
    };
    expect("sizeS", m.size_s())?;
    expect("sizeT", m.size_t())?;
    expect("bucketsS", m.buckets_s() as u64)?;
    expect("bucketsT", m.buckets_t() as u64)?;
    if props.get("bucketsS").is_none() {
        expect("buckets", m.buckets_s() as u64)?;
    }
    if props.get("bucketsT").is_none() {
        expect("buckets", m.buckets_t() as u64)?;
    }
    Ok(())
}
