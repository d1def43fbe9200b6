use thetapart_core::error::PartitioningError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// A record was readable but one of its fields was not.
    #[error("{file}:{line}: {msg}")]
    Parse { file: String, line: u64, msg: String },

    #[error(transparent)]
    Core(#[from] PartitioningError),
}

impl Error {
    pub(crate) fn parse(file: &str, line: u64, msg: impl Into<String>) -> Self {
        Error::Parse {
            file: file.to_string(),
            line,
            msg: msg.into(),
        }
    }
}
