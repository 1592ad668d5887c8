pub mod consumer;
pub mod event;
pub mod job;

use thiserror::Error;

use crate::core::client::billing::BillingError;
use crate::core::client::database::DatabaseError;
use crate::core::client::queue::QueueError;
use crate::core::client::storage::StorageError;
use crate::core::client::worker::WorkerError;
use crate::error::event::EventSystemError;
pub use consumer::ConsumptionError;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Error types for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Queue error: {0}")]
    QueueCoreError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseCoreError(#[from] DatabaseError),

    #[error("Worker error: {0}")]
    WorkerCoreError(#[from] WorkerError),

    #[error("Billing error: {0}")]
    BillingCoreError(#[from] BillingError),

    #[error("Event system error: {0}")]
    EventSystemError(#[from] Box<EventSystemError>),

    /// Run Command error
    #[error("Run Command Error: {0}")]
    RunCommandError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Orchestrator Error: {0}")]
    OrchestratorAnyHowError(#[from] anyhow::Error),
}

impl From<EventSystemError> for OrchestratorError {
    fn from(err: EventSystemError) -> Self {
        OrchestratorError::EventSystemError(Box::new(err))
    }
}
