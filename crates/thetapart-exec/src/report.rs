//! Run report: what was searched, what was found, how long it took.
//!
//! The serialized report lands in `report.json` next to the partitioning
//! files; the partition sets themselves are exported as CSV.

use std::path::Path;

use serde::Serialize;

use thetapart_core::hash::Hash256;
use thetapart_core::matrix::JoinMatrix;
use thetapart_core::metrics::MetricsScore;
use thetapart_core::partition::{CostKind, PartitionSet};
use thetapart_io::export::{PartitioningExporter, REPORT_FILE};

use crate::runtime::ExecError;

/// Best range-search sample under one weight set, re-executed.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub weights: String,
    pub threshold: u64,
    pub score: f64,
    pub partition_count: usize,
    pub mapping_digest: Hash256,
    pub statistics: MetricsScore,
    /// Samples sorted by this weight set's score, best first.
    #[serde(skip)]
    pub ranked: Vec<MetricsScore>,
    #[serde(skip)]
    pub partitions: PartitionSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub lower: u64,
    pub upper: u64,
    pub probes: u32,
    pub range_ms: u64,
    /// In sampling order, most permissive threshold first.
    pub samples: Vec<MetricsScore>,
    #[serde(skip)]
    pub normalized: Vec<MetricsScore>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub engine_version: String,
    pub matrix_digest: Hash256,
    pub policy: String,
    pub cost_kind: CostKind,
    pub num_partitions: usize,
    pub lower_bound: u64,
    pub upper_bound: u64,
    pub threshold: u64,
    pub partition_count: usize,
    pub probes: u32,
    /// Digest of the bucket mapping; equal digests mean identical placement.
    pub mapping_digest: Hash256,
    pub statistics: MetricsScore,
    pub range: Option<RangeReport>,

    /// Milliseconds since Unix epoch (UTC).
    pub started_ms: u64,
    pub finished_ms: u64,
    pub init_ms: u64,
    pub search_ms: u64,

    #[serde(skip)]
    pub partitions: PartitionSet,
}

impl RunReport {
    pub fn execution_times(&self) -> Vec<(&'static str, u64)> {
        let mut times = vec![("init", self.init_ms), ("search", self.search_ms)];
        if let Some(r) = &self.range {
            times.push(("range", r.range_ms));
        }
        times.push(("total", self.finished_ms.saturating_sub(self.started_ms)));
        times
    }

    /// Write the binary-search result into `dir`, and every range selection
    /// into `dir/selection-<i>`.
    pub fn export(&self, m: &JoinMatrix, dir: &Path) -> Result<(), ExecError> {
        let out = PartitioningExporter::create(dir)?;
        out.export_partitioning(m, &self.partitions)?;
        out.export_statistics(&self.statistics)?;
        out.export_execution_times(&self.execution_times())?;
        if let Some(range) = &self.range {
            out.export_range_metrics(&range.samples, &range.normalized)?;
            for (i, sel) in range.selections.iter().enumerate() {
                let sub = PartitioningExporter::create(dir.join(format!("selection-{i}")))?;
                sub.export_partitioning(m, &sel.partitions)?;
                sub.export_statistics(&sel.statistics)?;
                sub.export_range_metrics(&sel.ranked, &[])?;
            }
        }
        out.export_json(REPORT_FILE, self)?;
        Ok(())
    }
}
