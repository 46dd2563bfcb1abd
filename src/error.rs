use std::path::PathBuf;

use thiserror::Error;

/// Failure at the data-load boundary. Row-level problems never surface here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error("CSV parse worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
