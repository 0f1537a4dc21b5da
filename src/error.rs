use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching and converting an OpenImages subset.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no class labels were requested")]
    NoLabels,
    #[error("class label '{0}' was not found in the OpenImages class descriptions")]
    LabelNotFound(String),
    #[error("failed to retrieve {url}: {reason}")]
    Retrieval { url: String, reason: String },
    #[error("failed to parse table {table}: {source}")]
    Table {
        table: String,
        #[source]
        source: csv::Error,
    },
    #[error("image file {} is missing or unreadable: {reason}", path.display())]
    MissingImage { path: PathBuf, reason: String },
    #[error("failed to download {key}: {reason}")]
    Download { key: String, reason: String },
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors that end the current split but leave the rest of the run alone.
    pub fn is_split_scoped(&self) -> bool {
        matches!(self, Error::Retrieval { .. } | Error::Table { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
