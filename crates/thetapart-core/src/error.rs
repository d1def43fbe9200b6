use thiserror::Error;

/// Canonical result for core and search.
pub type Result<T> = std::result::Result<T, PartitioningError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitioningError {
    /// A threshold search was started with crossed bounds. This is a caller
    /// or configuration bug, never a property of the data.
    #[error("inverted search bounds: lower {lower} > upper {upper}")]
    InvertedBounds { lower: u64, upper: u64 },

    /// Even the most permissive probed threshold needs more than `partitions`
    /// groups. Callers may retry with another policy.
    #[error("cannot cover the matrix with {partitions} partitions (threshold {threshold})")]
    InfeasibleBudget { partitions: usize, threshold: u64 },

    /// Matrix/boundary/count records are inconsistent with each other.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("hashing error: {0}")]
    Hash(String),
}

impl From<serde_json::Error> for PartitioningError {
    fn from(e: serde_json::Error) -> Self {
        PartitioningError::Hash(e.to_string())
    }
}
