use thiserror::Error;

use crate::error::job::JobError;
use crate::error::ConsumptionError;

/// Result type for queue consumers
pub type EventSystemResult<T> = Result<T, EventSystemError>;

/// Errors raised while consuming and handling dispatcher messages.
#[derive(Error, Debug)]
pub enum EventSystemError {
    #[error("Message Parsing Serde Error: {0}")]
    PayloadSerdeError(String),

    #[error("Mutex poisoned: {0}")]
    MutexPoisonError(String),

    #[error("Worker task failed: {0}")]
    TaskJoinError(String),

    #[error("Job error: {0}")]
    FromJobError(#[from] JobError),

    #[error("ConsumptionError: {0}")]
    FromConsumptionError(#[from] ConsumptionError),
}
