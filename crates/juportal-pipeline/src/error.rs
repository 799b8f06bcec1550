use std::path::PathBuf;

use juportal_store::StoreError;
use thiserror::Error;

/// Conditions that stop a run before any record is processed, or prevent
/// its outputs from being written.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot start worker pool: {0}")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}
