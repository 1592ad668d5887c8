use std::time::Instant;

use chrono::Utc;
use opentelemetry::KeyValue;
use tracing::{debug, info, instrument, warn};

use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::sequencer::pairing::{pair_steps, validate_merge_pair};
use crate::sequencer::Sequencer;
use crate::types::jobs::job_item::JobItem;
use crate::types::proof_marker::ProofMarker;
use crate::types::queue::{QueueType, StepQueueMessage};
use crate::types::steps::step_item::StepItem;
use crate::types::steps::types::StepStatus;
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::worker::service::JobService;

impl Sequencer {
    /// One reduction pass. `Ok(true)` means keep polling, `Ok(false)` means
    /// the job reached a terminal outcome.
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn run_iteration(job_id: &str, config: &Config) -> JobResult<bool> {
        let start = Instant::now();
        let outcome = Self::reduce(job_id, config).await;
        let attributes = [KeyValue::new("outcome", if outcome.is_ok() { "ok" } else { "error" })];
        ORCHESTRATOR_METRICS.iteration_duration.record(start.elapsed().as_secs_f64() * 1000.0, &attributes);
        outcome
    }

    async fn reduce(job_id: &str, config: &Config) -> JobResult<bool> {
        let markers = config.database().get_proof_markers(job_id).await?;
        if markers.is_empty() {
            debug!("No proof ready yet");
            return Ok(true);
        }

        let job = config
            .database()
            .get_job(job_id)
            .await?
            .ok_or_else(|| JobError::JobNotFound { id: job_id.to_string() })?;

        if job.status.is_terminal() {
            debug!(status = %job.status, "Job already terminal");
            return Ok(false);
        }
        if Self::is_expired(&job, config.sequencer_params(), Utc::now()) {
            JobService::fail_job(job_id, "Job exceeded its maximum run time", config).await?;
            return Ok(false);
        }

        if let [marker] = markers.as_slice() {
            return Self::try_finalize(&job, marker, config).await;
        }

        Self::merge_round(&job, &markers, config).await
    }

    /// Pairs adjacent finished steps, claims both sides of every pair and
    /// dispatches one merge step per fully claimed pair.
    async fn merge_round(job: &JobItem, markers: &[ProofMarker], config: &Config) -> JobResult<bool> {
        let mut steps = Vec::with_capacity(markers.len());
        for marker in markers {
            match config.database().get_step(&job.id, &marker.step_id).await? {
                Some(step) if step.status == StepStatus::Finished => steps.push(step),
                Some(step) => debug!(step_id = %step.step_id, status = %step.status, "Step not available for pairing"),
                None => {
                    warn!(step_id = %marker.step_id, "Dropping proof marker without a step");
                    config.database().delete_proof_marker(&job.id, &marker.step_id).await?;
                }
            }
        }

        let pairs = pair_steps(&steps)?;
        if pairs.is_empty() {
            debug!(ready = steps.len(), "No adjacent steps to merge yet");
            return Ok(true);
        }

        let mut claimed = Vec::with_capacity(pairs.len());
        for (left, right) in pairs {
            if let Some(pair) = Self::claim_pair(&steps[left], &steps[right], config).await? {
                claimed.push(pair);
            }
        }

        if claimed.is_empty() {
            debug!("Every pair was claimed by a concurrent iteration");
            return Ok(true);
        }

        if let Err(e) = claimed.iter().try_for_each(|(left, right)| validate_merge_pair(left, right)) {
            for (left, right) in &claimed {
                Self::release_claim(left, config).await;
                Self::release_claim(right, config).await;
            }
            return Err(e);
        }

        for (index, (left, right)) in claimed.iter().enumerate() {
            if let Err(e) = Self::dispatch_merge(left, right, config).await {
                // dispatch_merge settles its own pair, the pairs after it are still claimed
                for (left, right) in &claimed[index + 1..] {
                    Self::release_claim(left, config).await;
                    Self::release_claim(right, config).await;
                }
                return Err(e);
            }
        }

        info!(merges = claimed.len(), "Merge round dispatched");
        Ok(true)
    }

    /// Claims `left` then `right`. A lost claim on `right` releases `left`.
    async fn claim_pair(left: &StepItem, right: &StepItem, config: &Config) -> JobResult<Option<(StepItem, StepItem)>> {
        let Some(left) = config.database().claim_step(&left.job_id, &left.step_id).await? else {
            ORCHESTRATOR_METRICS.claims_lost.add(1, &[]);
            debug!(step_id = %left.step_id, "Lost claim");
            return Ok(None);
        };

        match config.database().claim_step(&right.job_id, &right.step_id).await {
            Ok(Some(right)) => Ok(Some((left, right))),
            Ok(None) => {
                ORCHESTRATOR_METRICS.claims_lost.add(1, &[]);
                debug!(step_id = %right.step_id, "Lost claim, releasing partner");
                Self::release_claim(&left, config).await;
                Ok(None)
            }
            Err(e) => {
                Self::release_claim(&left, config).await;
                Err(e.into())
            }
        }
    }

    /// Puts a claimed step back to `finished`. Failures are only logged: a
    /// step stuck in `used` shows up in the health check.
    pub(crate) async fn release_claim(step: &StepItem, config: &Config) {
        match config.database().release_step(&step.job_id, &step.step_id).await {
            Ok(Some(_)) => debug!(step_id = %step.step_id, "Claim released"),
            Ok(None) => warn!(step_id = %step.step_id, "Claimed step was no longer used when releasing"),
            Err(e) => warn!(step_id = %step.step_id, error = %e, "Failed to release claim"),
        }
    }

    /// Creates and dispatches the merge of two claimed steps, then drops the
    /// consumed steps and their markers.
    async fn dispatch_merge(left: &StepItem, right: &StepItem, config: &Config) -> JobResult<()> {
        let merge = StepItem::merge(left, right);
        let message = StepQueueMessage { job_id: merge.job_id.clone(), step_id: merge.step_id.clone(), chain: merge.chain.clone() };
        let payload = serde_json::to_string(&message)?;

        let merge = match config.database().create_step(merge).await {
            Ok(merge) => merge,
            Err(e) => {
                Self::release_claim(left, config).await;
                Self::release_claim(right, config).await;
                return Err(e.into());
            }
        };

        if let Err(e) = config.queue().send_message(QueueType::StepRun, payload, None).await {
            if let Err(delete_error) = config.database().delete_step(&merge.job_id, &merge.step_id).await {
                warn!(step_id = %merge.step_id, error = %delete_error, "Failed to drop undispatched merge step");
            }
            Self::release_claim(left, config).await;
            Self::release_claim(right, config).await;
            return Err(e.into());
        }

        ORCHESTRATOR_METRICS.merges_created.add(1, &[]);
        info!(
            step_id = %merge.step_id,
            left = %left.step_id,
            right = %right.step_id,
            origins = merge.origins.len(),
            "Merge step dispatched"
        );

        // Marker first: a consumed step left behind without its marker is inert
        for consumed in [left, right] {
            config.database().delete_proof_marker(&consumed.job_id, &consumed.step_id).await?;
            config.database().delete_step(&consumed.job_id, &consumed.step_id).await?;
        }

        Ok(())
    }
}
