pub mod error;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
pub use error::WorkerError;

use crate::types::steps::step_item::StepItem;
use crate::types::steps::types::StepTask;

/// Identifies the worker instance that serves a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerContext {
    pub developer: String,
    pub repo: String,
    pub worker_version: Option<String>,
    pub chain: String,
    pub job_id: String,
    pub step_id: String,
    pub task: StepTask,
}

impl From<&StepItem> for WorkerContext {
    fn from(step: &StepItem) -> Self {
        Self {
            developer: step.developer.clone(),
            repo: step.repo.clone(),
            worker_version: step.worker_version.clone(),
            chain: step.chain.clone(),
            job_id: step.job_id.clone(),
            step_id: step.step_id.clone(),
            task: step.task,
        }
    }
}

/// Opaque proof capability of one developer/repo pair.
///
/// `Ok(None)` is a soft failure: the worker ran but produced no proof.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProofWorker: Send + Sync {
    async fn create(&self, input: &str) -> Result<Option<String>, WorkerError>;
    async fn merge(&self, left: &str, right: &str) -> Result<Option<String>, WorkerError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    async fn get_worker(&self, context: &WorkerContext) -> Result<Arc<dyn ProofWorker>, WorkerError>;
    /// Asks the host to replace the instance that served `context`.
    async fn restart(&self, context: &WorkerContext, reason: &str) -> Result<(), WorkerError>;
}
