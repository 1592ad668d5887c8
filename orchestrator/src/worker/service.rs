use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::client::database::DatabaseError;
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::types::constant::MAX_JOB_UPDATE_RETRIES;
use crate::types::jobs::job_item::{JobItem, SubmitJobRequest};
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::queue::{QueueType, SequencerQueueMessage};
use crate::types::TransactionsBlob;
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::utils::webhook::notify_webhook;

/// Job record as returned by the status query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JobStatusResponse {
    pub job: JobItem,
    /// Step log excerpts, only when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
}

/// Submission, status query and failure of jobs.
pub struct JobService;

impl JobService {
    /// Stores the input blob, creates the job and triggers the sequencer.
    #[instrument(skip(request, config), fields(owner_id = %request.owner_id))]
    pub async fn submit_job(request: SubmitJobRequest, config: &Config) -> JobResult<JobItem> {
        Self::validate_request(&request)?;

        let job = JobItem::from_request(&request);
        let filename = job
            .filename
            .clone()
            .ok_or_else(|| JobError::Other(format!("Job {} has no input blob key", job.id)))?;

        let blob = serde_json::to_vec(&TransactionsBlob { transactions: request.transactions })?;
        config.storage().put_data(Bytes::from(blob), &filename).await?;

        let job = config.database().create_job(job).await?;

        let message = SequencerQueueMessage { job_id: job.id.clone() };
        config.queue().send_message(QueueType::SequencerStart, serde_json::to_string(&message)?, None).await?;

        ORCHESTRATOR_METRICS.jobs_submitted.add(1, &[]);
        info!(job_id = %job.id, tx_number = job.tx_number, "Job submitted");
        Ok(job)
    }

    fn validate_request(request: &SubmitJobRequest) -> JobResult<()> {
        if request.transactions.is_empty() {
            return Err(JobError::ValidationError("A job needs at least one transaction".to_string()));
        }
        for (name, value) in [
            ("owner_id", &request.owner_id),
            ("developer", &request.developer),
            ("repo", &request.repo),
            ("task", &request.task),
        ] {
            if value.trim().is_empty() {
                return Err(JobError::ValidationError(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Returns the job as read. A finished job moves to `used` as a side
    /// effect, without blocking the response on it.
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn get_job_status(
        owner_id: &str,
        job_id: &str,
        include_logs: bool,
        config: &Config,
    ) -> JobResult<JobStatusResponse> {
        let job = match config.database().get_job(job_id).await? {
            Some(job) if job.owner_id == owner_id => job,
            _ => return Err(JobError::JobNotFound { id: job_id.to_string() }),
        };

        if job.status == JobStatus::Finished {
            match config.database().update_job_status_if(job_id, JobStatus::Finished, JobStatus::Used, Utc::now()).await {
                Ok(Some(_)) => debug!("Job marked as used"),
                Ok(None) => debug!("Job already left finished"),
                Err(e) => warn!(error = %e, "Failed to mark job as used"),
            }
        }

        let logs = match include_logs {
            true => Some(Self::read_log_excerpts(&job, config).await),
            false => None,
        };

        Ok(JobStatusResponse { job, logs })
    }

    async fn read_log_excerpts(job: &JobItem, config: &Config) -> Vec<String> {
        let mut excerpts = Vec::with_capacity(job.logs.len());
        for key in &job.logs {
            match config.storage().get_data(key).await {
                Ok(data) => excerpts.push(String::from_utf8_lossy(&data).to_string()),
                Err(e) => debug!(key = %key, error = %e, "Skipping unreadable log excerpt"),
            }
        }
        excerpts
    }

    /// Marks the job `failed`, keeping the reason in `result` when none is
    /// set. Terminal jobs are left untouched.
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn fail_job(job_id: &str, reason: &str, config: &Config) -> JobResult<()> {
        let Some(job) = config.database().get_job(job_id).await? else {
            return Err(JobError::JobNotFound { id: job_id.to_string() });
        };

        let failed_at = Utc::now();
        let failed = Self::update_job_with_retries(job, config, |current| {
            if current.status.is_terminal() {
                return Ok(None);
            }
            let mut updates = JobItemUpdates::new().update_status(JobStatus::Failed).update_failed_at(failed_at);
            if current.result.is_none() {
                updates = updates.update_result(reason.to_string());
            }
            updates.build().map(Some)
        })
        .await?;

        match failed {
            Some(job) => {
                ORCHESTRATOR_METRICS.jobs_failed.add(1, &[]);
                warn!(reason = %reason, "Job failed");
                notify_webhook(&job).await;
            }
            None => debug!("Job already terminal, not failing it"),
        }
        Ok(())
    }

    /// Applies the updates `build` derives from the latest job record,
    /// reloading and retrying when a concurrent writer bumped the version.
    /// `build` returning `None` skips the update.
    pub(crate) async fn update_job_with_retries<F>(job: JobItem, config: &Config, build: F) -> JobResult<Option<JobItem>>
    where
        F: Fn(&JobItem) -> JobResult<Option<JobItemUpdates>>,
    {
        let mut current = job;
        for attempt in 1..=MAX_JOB_UPDATE_RETRIES {
            let Some(updates) = build(&current)? else {
                return Ok(None);
            };

            match config.database().update_job(&current, updates).await {
                Ok(updated) => return Ok(Some(updated)),
                Err(DatabaseError::UpdateFailed(_)) if attempt < MAX_JOB_UPDATE_RETRIES => {
                    debug!(attempt, "Job version moved, reloading");
                    current = config
                        .database()
                        .get_job(&current.id)
                        .await?
                        .ok_or_else(|| JobError::JobNotFound { id: current.id.clone() })?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(JobError::Other(format!("Job {} kept changing while updating it", current.id)))
    }
}
