//! Partitioning configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{PartitioningError, Result};
use crate::partition::CostKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionerConfig {
    /// Partition budget `P`. Every feasible probe returns at most this many groups.
    pub num_partitions: usize,

    /// Quantity bounded by the threshold.
    pub cost_kind: CostKind,

    /// Range search sweeps `[base, base * range_upper_factor]`, where `base`
    /// is the binary-search optimum.
    pub range_upper_factor: f64,

    /// Number of thresholds sampled by a range search (both endpoints included).
    pub range_granularity: usize,
}

impl Default for PartitionerConfig {
    fn default() -> Self {
        Self {
            num_partitions: 16,
            cost_kind: CostKind::InputCost,
            range_upper_factor: 2.0,
            range_granularity: 10,
        }
    }
}

impl PartitionerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `THETAPART_NUM_PARTITIONS`: partition budget
    /// - `THETAPART_COST_KIND`: `input-cost` or `candidate-cells`
    /// - `THETAPART_RANGE_UPPER_FACTOR`: range search upper factor
    /// - `THETAPART_RANGE_GRANULARITY`: range search sample count
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("THETAPART_NUM_PARTITIONS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.num_partitions = v;
            }
        }

        if let Ok(s) = std::env::var("THETAPART_COST_KIND") {
            if let Ok(v) = s.parse::<CostKind>() {
                cfg.cost_kind = v;
            }
        }

        if let Ok(s) = std::env::var("THETAPART_RANGE_UPPER_FACTOR") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.range_upper_factor = v;
            }
        }

        if let Ok(s) = std::env::var("THETAPART_RANGE_GRANULARITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.range_granularity = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_partitions == 0 {
            return Err(PartitioningError::Config(
                "num_partitions must be at least 1".into(),
            ));
        }
        if u32::try_from(self.num_partitions).is_err() {
            return Err(PartitioningError::Config(format!(
                "num_partitions {} exceeds the partition id space",
                self.num_partitions
            )));
        }
        if !self.range_upper_factor.is_finite() || self.range_upper_factor < 1.0 {
            return Err(PartitioningError::Config(format!(
                "range_upper_factor must be a finite value >= 1 (got {})",
                self.range_upper_factor
            )));
        }
        Ok(())
    }
}
