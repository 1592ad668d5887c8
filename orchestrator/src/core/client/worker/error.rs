use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Worker service returned status {0}")]
    WorkerService(StatusCode),

    #[error("Worker call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to build worker url: {0}")]
    InvalidUrl(String),

    #[error("No worker available for {developer}/{repo}")]
    Unavailable { developer: String, repo: String },
}
