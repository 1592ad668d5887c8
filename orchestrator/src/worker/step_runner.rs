use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::core::client::database::DatabaseError;
use crate::core::client::worker::http::with_timeout;
use crate::core::client::worker::{WorkerContext, WorkerError};
use crate::core::config::Config;
use crate::error::job::JobResult;
use crate::types::constant::STEP_LOGS_PREFIX;
use crate::types::proof_marker::ProofMarker;
use crate::types::steps::step_item::StepItem;
use crate::types::steps::step_updates::StepItemUpdates;
use crate::types::steps::types::{StepStatus, StepTask};
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::worker::service::JobService;

/// How one worker call ended.
enum Outcome {
    Proof(String),
    /// The worker ran but returned nothing
    Empty,
    Failed(WorkerError),
}

/// Executes single steps against their proof worker.
pub struct StepRunner;

impl StepRunner {
    /// BlobStore key of the log excerpt of one attempt.
    pub fn log_key(job_id: &str, step_id: &str, attempt: u32) -> String {
        format!("{}/{}/{}/{}.log", STEP_LOGS_PREFIX, job_id, step_id, attempt)
    }

    /// Runs one attempt of a step.
    ///
    /// Worker failures are recorded on the step and the job and end in
    /// `Ok(())`. Only store, blob and dispatcher errors are returned, so the
    /// delivery is retried.
    #[instrument(skip(config), fields(job_id = %job_id, step_id = %step_id))]
    pub async fn run_step(job_id: &str, step_id: &str, config: Arc<Config>) -> JobResult<()> {
        let Some(step) = config.database().get_step(job_id, step_id).await? else {
            warn!("Step no longer exists, skipping");
            return Ok(());
        };

        match step.status {
            StepStatus::Created | StepStatus::Started => {}
            status => {
                debug!(status = %status, "Step already ran, skipping");
                return Ok(());
            }
        }

        // `attempts` counts runs already made, so a step runs at most `max_attempts` times
        let max_attempts = config.sequencer_params().max_step_attempts;
        if step.attempts >= max_attempts {
            let reason = format!("Step {} exhausted its {} attempts", step.step_id, max_attempts);
            Self::fail_step(&step, &reason, None, &config).await?;
            return Ok(());
        }

        let attempt = step.attempts + 1;
        let started = match config
            .database()
            .update_step(
                &step,
                StepItemUpdates::new()
                    .update_status(StepStatus::Started)
                    .update_attempts(attempt)
                    .update_started_at(Utc::now())
                    .build()?,
            )
            .await
        {
            Ok(started) => started,
            Err(DatabaseError::UpdateFailed(_)) => {
                debug!("Step picked up by another runner");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if started.step_data.len() != started.task.arity() {
            let reason = format!(
                "Step {} is a {} step with {} inputs, expected {}",
                started.step_id,
                started.task,
                started.step_data.len(),
                started.task.arity()
            );
            Self::fail_step(&started, &reason, None, &config).await?;
            return Ok(());
        }

        let context = WorkerContext::from(&started);
        let call_start = Instant::now();
        let outcome = match Self::call_worker(&started, &context, &config).await {
            Ok(Some(proof)) => Outcome::Proof(proof),
            Ok(None) => Outcome::Empty,
            Err(e) => Outcome::Failed(e),
        };
        let elapsed_ms = call_start.elapsed().as_millis() as u64;

        let log_key = Self::write_attempt_log(&started, attempt, &outcome, elapsed_ms, &config).await;

        match outcome {
            Outcome::Proof(proof) => Self::finish_step(&started, proof, log_key, &config).await,
            Outcome::Empty => {
                let reason = format!("Worker returned no proof for step {}", started.step_id);
                Self::fail_step(&started, &reason, log_key, &config).await
            }
            Outcome::Failed(e) => {
                let reason = format!("Worker call for step {} failed: {}", started.step_id, e);
                error!(error = %e, "Worker call failed");
                Self::fail_step(&started, &reason, log_key, &config).await?;
                if let Err(restart_error) = config.workers().restart(&context, &reason).await {
                    warn!(error = %restart_error, "Failed to request worker restart");
                }
                Ok(())
            }
        }
    }

    async fn call_worker(step: &StepItem, context: &WorkerContext, config: &Config) -> Result<Option<String>, WorkerError> {
        let worker = config.workers().get_worker(context).await?;
        let limit = config.params().worker_timeout;
        match step.task {
            StepTask::Create => with_timeout(limit, worker.create(&step.step_data[0])).await,
            StepTask::Merge => with_timeout(limit, worker.merge(&step.step_data[0], &step.step_data[1])).await,
        }
    }

    /// Stores the result, then the proof marker that makes it visible to the
    /// sequencer.
    async fn finish_step(step: &StepItem, proof: String, log_key: Option<String>, config: &Config) -> JobResult<()> {
        let mut updates = StepItemUpdates::new()
            .update_status(StepStatus::Finished)
            .update_result(proof)
            .update_finished_at(Utc::now());
        if let Some(logs) = Self::logs_with(step, log_key) {
            updates = updates.update_logs(logs);
        }

        let finished = match config.database().update_step(step, updates.build()?).await {
            Ok(finished) => finished,
            Err(DatabaseError::UpdateFailed(_)) => {
                debug!("Step superseded by a newer attempt, dropping result");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        config.database().create_proof_marker(ProofMarker::new(&finished.job_id, &finished.step_id)).await?;
        ORCHESTRATOR_METRICS.steps_finished.add(1, &[]);
        info!(attempts = finished.attempts, compute_ms = finished.compute_time_ms().unwrap_or_default(), "Step finished");
        Ok(())
    }

    /// Marks the step and its job `failed`.
    async fn fail_step(step: &StepItem, reason: &str, log_key: Option<String>, config: &Config) -> JobResult<()> {
        let mut updates = StepItemUpdates::new().update_status(StepStatus::Failed).update_failed_at(Utc::now());
        if let Some(logs) = Self::logs_with(step, log_key) {
            updates = updates.update_logs(logs);
        }

        match config.database().update_step(step, updates.build()?).await {
            Ok(_) => {}
            Err(DatabaseError::UpdateFailed(_)) => {
                debug!("Step superseded by a newer attempt, not failing it");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        ORCHESTRATOR_METRICS.steps_failed.add(1, &[]);
        warn!(reason = %reason, "Step failed");
        JobService::fail_job(&step.job_id, reason, config).await
    }

    fn logs_with(step: &StepItem, log_key: Option<String>) -> Option<Vec<String>> {
        let key = log_key?;
        let mut logs = step.logs.clone();
        logs.push(key);
        Some(logs)
    }

    /// Writes a short excerpt for this attempt. A failed write only costs the
    /// excerpt.
    async fn write_attempt_log(
        step: &StepItem,
        attempt: u32,
        outcome: &Outcome,
        elapsed_ms: u64,
        config: &Config,
    ) -> Option<String> {
        let summary = match outcome {
            Outcome::Proof(_) => "proof produced".to_string(),
            Outcome::Empty => "no proof returned".to_string(),
            Outcome::Failed(e) => format!("failed: {}", e),
        };
        let excerpt = format!(
            "[{}] job={} step={} task={} attempt={} elapsed_ms={} {}",
            Utc::now().to_rfc3339(),
            step.job_id,
            step.step_id,
            step.task,
            attempt,
            elapsed_ms,
            summary
        );

        let key = Self::log_key(&step.job_id, &step.step_id, attempt);
        match config.storage().put_data(Bytes::from(excerpt), &key).await {
            Ok(()) => Some(key),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to store step log excerpt");
                None
            }
        }
    }
}

