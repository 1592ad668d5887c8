use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::core::client::database::DatabaseError;
use crate::core::client::storage::StorageError;
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::sequencer::Sequencer;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::JobStatus;
use crate::types::queue::{QueueType, StepQueueMessage};
use crate::types::steps::step_item::StepItem;
use crate::types::TransactionsBlob;
use crate::worker::service::JobService;

impl Sequencer {
    /// Creates and dispatches the leaf steps of a job, marks it `started` and
    /// runs the reduction loop.
    ///
    /// Redelivered triggers are tolerated: leaves that already exist are only
    /// re-dispatched, and a job that is already `started` goes straight to the
    /// run loop.
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn start_job(job_id: &str, config: Arc<Config>) -> JobResult<()> {
        let job = config
            .database()
            .get_job(job_id)
            .await?
            .ok_or_else(|| JobError::JobNotFound { id: job_id.to_string() })?;

        match job.status {
            JobStatus::Created => {}
            JobStatus::Started => {
                info!("Job already started, resuming run loop");
                return Self::run(job_id, config).await;
            }
            status => {
                debug!(status = %status, "Job already terminal, nothing to start");
                return Ok(());
            }
        }

        match Self::create_leaf_steps(&job, &config).await {
            Ok(count) => info!(leaf_steps = count, "Leaf steps dispatched"),
            Err(e) if e.is_retryable() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Job input rejected");
                JobService::fail_job(job_id, &e.to_string(), &config).await?;
                return Ok(());
            }
        }

        if config.database().update_job_status_if(job_id, JobStatus::Created, JobStatus::Started, Utc::now()).await?.is_none()
        {
            debug!("Job left created concurrently");
        }

        Self::run(job_id, config).await
    }

    async fn create_leaf_steps(job: &JobItem, config: &Config) -> JobResult<u64> {
        if job.tx_number == 0 {
            return Err(JobError::ValidationError(format!("Job {} has no transactions", job.id)));
        }
        let filename = job
            .filename
            .as_deref()
            .ok_or_else(|| JobError::ValidationError(format!("Job {} has no input blob", job.id)))?;

        let data = match config.storage().get_data(filename).await {
            Ok(data) => data,
            Err(StorageError::ObjectNotFound(key)) => {
                return Err(JobError::ValidationError(format!("Input blob {} of job {} is missing", key, job.id)));
            }
            Err(e) => return Err(e.into()),
        };

        let blob: TransactionsBlob = serde_json::from_slice(&data)
            .map_err(|e| JobError::ValidationError(format!("Input blob of job {} is malformed: {}", job.id, e)))?;

        if blob.transactions.len() as u64 != job.tx_number {
            return Err(JobError::ValidationError(format!(
                "Job {} declares {} transactions but its input blob holds {}",
                job.id,
                job.tx_number,
                blob.transactions.len()
            )));
        }

        for (index, transaction) in blob.transactions.into_iter().enumerate() {
            let step = StepItem::leaf(job, index as u64, transaction);
            let message = StepQueueMessage { job_id: job.id.clone(), step_id: step.step_id.clone(), chain: job.chain.clone() };

            match config.database().create_step(step).await {
                Ok(_) | Err(DatabaseError::ItemAlreadyExists(_)) => {}
                Err(e) => return Err(e.into()),
            }

            config.queue().send_message(QueueType::StepRun, serde_json::to_string(&message)?, None).await?;
        }

        Ok(job.tx_number)
    }
}
