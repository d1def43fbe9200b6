//! Writes a partitioning run into an output directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::metrics::MetricsScore;
use thetapart_core::partition::{PartitionSet, PartitionShape};

use crate::error::Result;
use crate::writers::partitioning::{
    write_bucket_mapping, write_cells_mapping, write_execution_times, write_input_costs,
    write_range_metrics, write_rect_boundaries, write_statistics,
};

pub const MAPPING_FILE: &str = "histogramIndexToPartitionsMapping.csv";
pub const INPUT_COST_FILE: &str = "partitionsInputCost.csv";
pub const CELLS_FILE: &str = "partitionToCellsMapping.csv";
pub const STATISTICS_FILE: &str = "partitionsStatistics.csv";
pub const RECT_BOUNDARIES_FILE: &str = "rectangularBoundaries.csv";
pub const RANGE_METRICS_FILE: &str = "rangeSearchMetrics.csv";
pub const RANGE_METRICS_NORMALIZED_FILE: &str = "rangeSearchMetricsNormalized.csv";
pub const EXECUTION_TIMES_FILE: &str = "executionTimes.csv";
pub const REPORT_FILE: &str = "report.json";

pub struct PartitioningExporter {
    root: PathBuf,
}

impl PartitioningExporter {
    /// Creates `root` if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file(&self, name: &str) -> Result<BufWriter<File>> {
        Ok(BufWriter::new(File::create(self.root.join(name))?))
    }

    /// Mapping, input costs and cell lists; rectangle spans when the set
    /// holds rectangular partitions.
    pub fn export_partitioning(&self, m: &JoinMatrix, set: &PartitionSet) -> Result<()> {
        write_bucket_mapping(self.file(MAPPING_FILE)?, &set.bucket_mapping(m))?;
        write_input_costs(self.file(INPUT_COST_FILE)?, set, m)?;
        write_cells_mapping(self.file(CELLS_FILE)?, set)?;
        if set
            .iter()
            .any(|p| matches!(p, PartitionShape::Rectangular(_)))
        {
            write_rect_boundaries(self.file(RECT_BOUNDARIES_FILE)?, set)?;
        }
        Ok(())
    }

    pub fn export_statistics(&self, score: &MetricsScore) -> Result<()> {
        write_statistics(self.file(STATISTICS_FILE)?, score)
    }

    pub fn export_range_metrics(
        &self,
        samples: &[MetricsScore],
        normalized: &[MetricsScore],
    ) -> Result<()> {
        write_range_metrics(self.file(RANGE_METRICS_FILE)?, samples)?;
        write_range_metrics(self.file(RANGE_METRICS_NORMALIZED_FILE)?, normalized)
    }

    pub fn export_execution_times(&self, times: &[(&str, u64)]) -> Result<()> {
        write_execution_times(self.file(EXECUTION_TIMES_FILE)?, times)
    }

    /// Pretty JSON, newline terminated.
    pub fn export_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let mut w = self.file(name)?;
        serde_json::to_writer_pretty(&mut w, value)?;
        writeln!(w)?;
        w.flush()?;
        Ok(())
    }
}
