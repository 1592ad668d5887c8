use thiserror::Error;

use crate::core::client::billing::BillingError;
use crate::core::client::database::DatabaseError;
use crate::core::client::queue::QueueError;
use crate::core::client::storage::StorageError;
use crate::core::client::worker::WorkerError;
use crate::types::jobs::types::JobStatus;

pub type JobResult<T> = Result<T, JobError>;

/// Error types for the sequencer, the step runner and the job service
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to serialize data: {0}")]
    FailedToSerializeData(#[from] serde_json::Error),

    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Billing error: {0}")]
    BillingError(#[from] BillingError),

    #[error("Worker error: {0}")]
    WorkerError(#[from] WorkerError),

    #[error("Job {id} not found")]
    JobNotFound { id: String },

    #[error("Step {step_id} of job {job_id} not found")]
    StepNotFound { job_id: String, step_id: String },

    #[error("Job {id} is in status {status}, which is invalid for this operation")]
    InvalidStatus { id: String, status: JobStatus },

    /// Bad input or a broken data-model invariant, never retried
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl JobError {
    /// Transient infrastructure failures that a later attempt can get past.
    /// A lost optimistic update is a concurrency loss, which is retryable too.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::DatabaseError(e) => !matches!(e, DatabaseError::ItemAlreadyExists(_)),
            JobError::QueueError(_) | JobError::StorageError(_) | JobError::BillingError(_) => true,
            _ => false,
        }
    }
}
