use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::jobs::types::{ChargeStatus, JobStatus};
use crate::types::TransactionsBlob;
use crate::utils::helpers::generate_job_id;

/// A submitted proof job.
///
/// `tx_number` is fixed at creation and equals the number of leaf steps the
/// sequencer creates. `result` is written once, together with the transition
/// to [`JobStatus::Finished`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobItem {
    pub id: String,
    pub owner_id: String,
    pub developer: String,
    pub repo: String,
    pub task: String,
    pub args: Option<String>,
    pub metadata: Option<String>,
    pub worker_version: Option<String>,
    pub chain: String,
    pub tx_number: u64,
    /// BlobStore key of the input transactions
    pub filename: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    /// Accumulated compute time in milliseconds
    pub billed_duration: Option<u64>,
    /// Set once finalization starts charging the job
    #[serde(default)]
    pub charge_status: Option<ChargeStatus>,
    #[serde(default)]
    pub logs: Vec<String>,
    pub result: Option<String>,
    pub webhook: Option<String>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the submission path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmitJobRequest {
    pub owner_id: String,
    pub developer: String,
    pub repo: String,
    pub task: String,
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub worker_version: Option<String>,
    pub chain: String,
    pub transactions: Vec<String>,
    #[serde(default)]
    pub webhook: Option<String>,
}

impl JobItem {
    /// Builds a fresh job in [`JobStatus::Created`] for the request, pointing
    /// at the blob key the transactions will be written to.
    pub fn from_request(request: &SubmitJobRequest) -> Self {
        let id = generate_job_id();
        let now = Utc::now();
        Self {
            filename: Some(TransactionsBlob::key_for(&id)),
            id,
            owner_id: request.owner_id.clone(),
            developer: request.developer.clone(),
            repo: request.repo.clone(),
            task: request.task.clone(),
            args: request.args.clone(),
            metadata: request.metadata.clone(),
            worker_version: request.worker_version.clone(),
            chain: request.chain.clone(),
            tx_number: request.transactions.len() as u64,
            status: JobStatus::Created,
            created_at: now,
            started_at: None,
            finished_at: None,
            failed_at: None,
            used_at: None,
            billed_duration: None,
            charge_status: None,
            logs: Vec::new(),
            result: None,
            webhook: request.webhook.clone(),
            version: 0,
            updated_at: now,
        }
    }

    /// Milliseconds elapsed since the job was created.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_milliseconds()
    }
}
