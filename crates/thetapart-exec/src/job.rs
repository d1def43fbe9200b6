//! YAML job files.
//!
//! Example:
//! ```yaml
//! matrix_dir: data/band
//! output_dir: out/band
//! policy: rect            # or jaccard, manhattan, weighted:1:0.5, ...
//! num_partitions: 8
//! cost_kind: input-cost
//! search:
//!   mode: range
//!   upper_factor: 1.5
//!   granularity: 5
//!   weights:
//!     - "cross_max_input_cost=1,cross_replication_input_cost=0.5"
//! ```
//!
//! Every field is optional; unset budget and search parameters fall back to
//! the engine's `PartitionerConfig`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use thetapart_core::config::PartitionerConfig;
use thetapart_core::error::PartitioningError;
use thetapart_core::partition::CostKind;
use thetapart_search::{DistanceMeasure, Weights};

use crate::runtime::ExecError;

/// Used when a range search names no weight set.
pub const DEFAULT_WEIGHTS: &str = "cross_max_input_cost=1,cross_replication_input_cost=1";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Policy {
    /// Greedy row-band cover.
    #[default]
    Rect,
    /// Agglomerative merging under a distance measure.
    Cluster(DistanceMeasure),
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Rect => f.write_str("rect"),
            Policy::Cluster(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for Policy {
    type Err = PartitioningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rect" | "rectangular" => Ok(Policy::Rect),
            other => other.parse().map(Policy::Cluster),
        }
    }
}

impl TryFrom<String> for Policy {
    type Error = PartitioningError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Policy> for String {
    fn from(p: Policy) -> Self {
        p.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum SearchPolicy {
    /// Minimal feasible threshold only.
    #[default]
    Binary,
    /// Binary search, then sample `[base, base * upper_factor]` and pick the
    /// best sample for every weight set.
    Range {
        #[serde(default)]
        upper_factor: Option<f64>,
        #[serde(default)]
        granularity: Option<usize>,
        /// `name=w,name=w` strings.
        #[serde(default)]
        weights: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    pub matrix_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub policy: Policy,
    pub search: SearchPolicy,
    pub num_partitions: Option<usize>,
    pub cost_kind: Option<CostKind>,
}

impl JobSpec {
    pub fn from_yaml(src: &str) -> Result<Self, ExecError> {
        serde_yaml::from_str(src).map_err(|e| ExecError::Job(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self, ExecError> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| ExecError::Job(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&src)
    }

    pub fn to_yaml(&self) -> Result<String, ExecError> {
        serde_yaml::to_string(self).map_err(|e| ExecError::Job(e.to_string()))
    }

    /// Overlay this job on `base` and validate the result.
    pub fn resolve(&self, base: &PartitionerConfig) -> Result<PartitionerConfig, ExecError> {
        let mut cfg = base.clone();
        if let Some(p) = self.num_partitions {
            cfg.num_partitions = p;
        }
        if let Some(k) = self.cost_kind {
            cfg.cost_kind = k;
        }
        if let SearchPolicy::Range {
            upper_factor,
            granularity,
            ..
        } = &self.search
        {
            if let Some(f) = upper_factor {
                cfg.range_upper_factor = *f;
            }
            if let Some(g) = granularity {
                cfg.range_granularity = *g;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parsed weight sets of a range search; empty for binary search.
    pub fn weight_sets(&self) -> Result<Vec<Weights>, ExecError> {
        match &self.search {
            SearchPolicy::Binary => Ok(Vec::new()),
            SearchPolicy::Range { weights, .. } if weights.is_empty() => {
                Ok(vec![DEFAULT_WEIGHTS.parse()?])
            }
            SearchPolicy::Range { weights, .. } => weights
                .iter()
                .map(|w| w.parse::<Weights>().map_err(ExecError::from))
                .collect(),
        }
    }
}
