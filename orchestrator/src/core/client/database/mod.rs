pub mod error;
pub mod memory;
pub mod mongodb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use error::DatabaseError;

use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::proof_marker::ProofMarker;
use crate::types::steps::step_item::{StepHealthView, StepItem};
use crate::types::steps::step_updates::StepItemUpdates;

/// Store over the three collections of the system: jobs, steps and proof markers.
///
/// Every status change that matters for correctness goes through a
/// conditional write: either a versioned update (`update_job`, `update_step`)
/// or a status-precondition update (`claim_step`, `release_step`,
/// `update_job_status_if`). Implementations must perform these as a single
/// atomic compare-and-swap, never as read-then-write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Inserts the job, failing with [`DatabaseError::ItemAlreadyExists`] if the id is taken.
    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError>;
    async fn get_job(&self, id: &str) -> Result<Option<JobItem>, DatabaseError>;
    /// Applies `update` if the stored version still equals `current.version`.
    async fn update_job(&self, current: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError>;
    /// Moves the job from `expected` to `new` and stamps the matching
    /// timestamp. Returns `None` when the job was not in `expected`.
    async fn update_job_status_if(
        &self,
        id: &str,
        expected: JobStatus,
        new: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<JobItem>, DatabaseError>;

    async fn create_step(&self, step: StepItem) -> Result<StepItem, DatabaseError>;
    async fn get_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError>;
    async fn update_step(&self, current: &StepItem, update: StepItemUpdates) -> Result<StepItem, DatabaseError>;
    async fn delete_step(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError>;
    /// Atomic `finished -> used`. `None` means another caller holds the step.
    async fn claim_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError>;
    /// Atomic `used -> finished`, undoing a claim that could not be used.
    async fn release_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError>;
    async fn get_step_health(&self, job_id: &str) -> Result<Vec<StepHealthView>, DatabaseError>;

    async fn create_proof_marker(&self, marker: ProofMarker) -> Result<(), DatabaseError>;
    async fn get_proof_markers(&self, job_id: &str) -> Result<Vec<ProofMarker>, DatabaseError>;
    async fn delete_proof_marker(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError>;
}
