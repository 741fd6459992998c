use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, ScrapeError>;

/// Errors that end a run. Per-item tool failures are `FetchError`s and never reach here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Input file {0:?} does not exist.")]
    MissingInput(PathBuf),

    #[error("Malformed input JSON in {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("Refusing to use {0:?} as an output file name")]
    UnsafeFileName(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Walkdir Error: {0}")]
    Walk(#[from] walkdir::Error),
}
