use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::core::client::billing::ChargeRequest;
use crate::core::client::storage::StorageError;
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::sequencer::Sequencer;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{ChargeStatus, JobStatus};
use crate::types::proof_marker::ProofMarker;
use crate::types::steps::step_item::StepItem;
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::utils::webhook::notify_webhook;
use crate::worker::service::JobService;

impl Sequencer {
    /// Finalizes the job from its only ready step, if that step covers every
    /// transaction. Returns `Ok(false)` once the job is finished.
    ///
    /// The job's charge status moves to `pending` before the charge is issued
    /// and to `charged` once the billing service accepted it. A charged job
    /// keeps its final step claimed, and a failed finish write is resumed by
    /// the next iteration without charging again.
    pub(crate) async fn try_finalize(job: &JobItem, marker: &ProofMarker, config: &Config) -> JobResult<bool> {
        let Some(step) = config.database().get_step(&job.id, &marker.step_id).await? else {
            warn!(step_id = %marker.step_id, "Dropping proof marker without a step");
            config.database().delete_proof_marker(&job.id, &marker.step_id).await?;
            return Ok(true);
        };

        if !step.covers_all(job.tx_number) {
            debug!(step_id = %step.step_id, covered = step.origins.len(), "Only ready step is not final yet");
            return Ok(true);
        }

        match job.charge_status {
            Some(ChargeStatus::Charged) => {
                debug!(step_id = %step.step_id, "Job already charged, resuming finalization");
                return Self::finish(job, &step, config).await;
            }
            Some(ChargeStatus::Pending) => {
                warn!(step_id = %step.step_id, "Charge outcome unknown, leaving the job to the health check");
                return Ok(true);
            }
            None | Some(ChargeStatus::Rejected) => {}
        }

        let Some(step) = config.database().claim_step(&job.id, &step.step_id).await? else {
            ORCHESTRATOR_METRICS.claims_lost.add(1, &[]);
            debug!(step_id = %step.step_id, "Final step claimed by a concurrent iteration");
            return Ok(true);
        };

        let charged = match Self::charge(job, &step, config).await {
            Ok(charged) => charged,
            Err(ChargeFailure::BeforeCharge(e)) => {
                Self::release_claim(&step, config).await;
                return Err(e);
            }
            Err(ChargeFailure::Unrecorded(e)) => return Err(e),
        };

        Self::finish(&charged, &step, config).await
    }

    /// Charges the job for the claimed final step. Returns the job as stored
    /// with its charge recorded as `charged`.
    async fn charge(job: &JobItem, step: &StepItem, config: &Config) -> Result<JobItem, ChargeFailure> {
        if step.result.is_none() {
            return Err(ChargeFailure::BeforeCharge(JobError::ValidationError(format!(
                "Final step {} of job {} has no result",
                step.step_id, job.id
            ))));
        }
        let compute_time = step.compute_time_ms().ok_or_else(|| {
            ChargeFailure::BeforeCharge(JobError::ValidationError(format!(
                "Final step {} of job {} has no timestamps",
                step.step_id, job.id
            )))
        })?;
        let billed_duration = step.billed_duration + compute_time;

        let pending = Self::advance_charge(
            job,
            &[None, Some(ChargeStatus::Rejected)],
            JobItemUpdates::new().update_charge_status(ChargeStatus::Pending).update_billed_duration(billed_duration),
            config,
        )
        .await
        .map_err(ChargeFailure::BeforeCharge)?;

        let request = ChargeRequest { id: job.owner_id.clone(), job_id: job.id.clone(), billed_duration };
        if let Err(e) = config.billing().charge(request).await {
            let rejected = JobItemUpdates::new().update_charge_status(ChargeStatus::Rejected);
            return match Self::advance_charge(&pending, &[Some(ChargeStatus::Pending)], rejected, config).await {
                Ok(_) => Err(ChargeFailure::BeforeCharge(e.into())),
                Err(record_error) => {
                    error!(error = %record_error, "Failed to record the refused charge, keeping the final step claimed");
                    Err(ChargeFailure::Unrecorded(e.into()))
                }
            };
        }

        let charged = JobItemUpdates::new().update_charge_status(ChargeStatus::Charged);
        Self::advance_charge(&pending, &[Some(ChargeStatus::Pending)], charged, config).await.map_err(|e| {
            error!(error = %e, "Job was charged but the charge could not be recorded");
            ChargeFailure::Unrecorded(e)
        })
    }

    /// Versioned move of the job's charge status out of one of `expected`.
    async fn advance_charge(
        job: &JobItem,
        expected: &[Option<ChargeStatus>],
        updates: JobItemUpdates,
        config: &Config,
    ) -> JobResult<JobItem> {
        let updated = JobService::update_job_with_retries(job.clone(), config, |current| {
            if current.status.is_terminal() {
                return Err(JobError::InvalidStatus { id: current.id.clone(), status: current.status });
            }
            if !expected.contains(&current.charge_status) {
                return Err(JobError::Other(format!(
                    "Job {} has charge status {:?}, expected one of {:?}",
                    current.id, current.charge_status, expected
                )));
            }
            updates.clone().build().map(Some)
        })
        .await?;

        updated.ok_or_else(|| JobError::Other(format!("Job {} charge status was not updated", job.id)))
    }

    /// Stores the final result on a charged job and cleans up after it.
    async fn finish(job: &JobItem, step: &StepItem, config: &Config) -> JobResult<bool> {
        let result = step.result.clone().ok_or_else(|| {
            JobError::ValidationError(format!("Final step {} of job {} has no result", step.step_id, job.id))
        })?;

        let finished_at = Utc::now();
        let updated = JobService::update_job_with_retries(job.clone(), config, |current| {
            match current.status {
                JobStatus::Finished | JobStatus::Used => return Ok(None),
                JobStatus::Failed => {
                    return Err(JobError::InvalidStatus { id: current.id.clone(), status: current.status })
                }
                JobStatus::Created | JobStatus::Started => {}
            }
            let mut logs = current.logs.clone();
            logs.extend(step.logs.iter().cloned());
            JobItemUpdates::new()
                .update_status(JobStatus::Finished)
                .update_finished_at(finished_at)
                .update_result(result.clone())
                .update_logs(logs)
                .build()
                .map(Some)
        })
        .await?;

        let Some(finished) = updated else {
            debug!("Job finished by a concurrent iteration");
            return Ok(false);
        };

        Self::clean_up_finished(&finished, step, config).await;
        ORCHESTRATOR_METRICS.jobs_finished.add(1, &[]);
        info!(billed_duration_ms = finished.billed_duration.unwrap_or_default(), "Job finished");
        notify_webhook(&finished).await;
        Ok(false)
    }

    /// Drops the final step, its marker and the input blob. The job is already
    /// finished at this point, so failures are only logged.
    async fn clean_up_finished(job: &JobItem, step: &StepItem, config: &Config) {
        if let Err(e) = config.database().delete_proof_marker(&job.id, &step.step_id).await {
            warn!(step_id = %step.step_id, error = %e, "Failed to delete final proof marker");
        }
        if let Err(e) = config.database().delete_step(&job.id, &step.step_id).await {
            warn!(step_id = %step.step_id, error = %e, "Failed to delete final step");
        }
        if let Some(filename) = job.filename.as_deref() {
            match config.storage().delete_data(filename).await {
                Ok(()) | Err(StorageError::ObjectNotFound(_)) => {}
                Err(e) => warn!(key = %filename, error = %e, "Failed to delete input blob"),
            }
        }
    }
}

/// How charging a claimed final step went wrong.
enum ChargeFailure {
    /// Nothing was charged and the refusal, if any, is recorded, so the step
    /// can be released
    BeforeCharge(JobError),
    /// The charge status on the job does not reflect what happened, so the
    /// step stays claimed
    Unrecorded(JobError),
}
