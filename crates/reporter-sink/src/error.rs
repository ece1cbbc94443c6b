use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while persisting a result record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Opening, writing or syncing the result file failed.
    #[error("failed to append to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SinkError>;
