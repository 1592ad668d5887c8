use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::sequencer::Sequencer;
use crate::types::queue::{QueueType, SequencerQueueMessage};
use crate::worker::service::JobService;

impl Sequencer {
    /// Reduction loop of one job, bounded by `max_run_time`.
    ///
    /// When the budget runs out before the job is terminal the loop hands the
    /// job over to a fresh `sequencer_run` delivery.
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn run(job_id: &str, config: Arc<Config>) -> JobResult<()> {
        let params = config.sequencer_params().clone();
        let budget_start = Instant::now();
        let mut last_iteration: Option<Instant> = None;
        let mut iteration: u64 = 0;
        let mut consecutive_failures: u32 = 0;
        let mut keep_running = true;

        while keep_running && budget_start.elapsed() < params.max_run_time {
            if let Some(last) = last_iteration {
                let elapsed = last.elapsed();
                if elapsed < params.min_iteration_interval {
                    sleep(params.min_iteration_interval - elapsed).await;
                }
            }
            last_iteration = Some(Instant::now());
            iteration += 1;

            match Self::run_iteration(job_id, &config).await {
                Ok(next) => {
                    keep_running = next;
                    consecutive_failures = 0;
                }
                Err(e) if e.is_retryable() && consecutive_failures < params.max_iteration_retries => {
                    consecutive_failures += 1;
                    let backoff = retry_backoff(params.iteration_retry_backoff, consecutive_failures);
                    warn!(
                        error = %e,
                        attempt = consecutive_failures,
                        backoff_ms = backoff.as_millis() as u64,
                        "Iteration failed, retrying"
                    );
                    sleep(backoff).await;
                    continue;
                }
                Err(e) => {
                    error!(error = %e, iteration, "Iteration failed, failing job");
                    JobService::fail_job(job_id, &format!("Sequencer iteration failed: {}", e), &config).await?;
                    return Ok(());
                }
            }

            if keep_running && iteration % params.health_check_every == 0 {
                if let Err(e) = Self::check_health(job_id, &config).await {
                    warn!(error = %e, "Health check failed");
                }
            }
        }

        if !keep_running {
            debug!(iterations = iteration, "Run loop reached a terminal outcome");
            return Ok(());
        }

        Self::hand_over(job_id, &config).await
    }

    /// Re-dispatches the run loop once the run budget is spent, unless the job
    /// became terminal or outlived `max_job_time` meanwhile.
    async fn hand_over(job_id: &str, config: &Config) -> JobResult<()> {
        let job = config
            .database()
            .get_job(job_id)
            .await?
            .ok_or_else(|| JobError::JobNotFound { id: job_id.to_string() })?;

        if job.status.is_terminal() {
            debug!(status = %job.status, "Job became terminal, not re-dispatching");
            return Ok(());
        }

        if Self::is_expired(&job, config.sequencer_params(), Utc::now()) {
            JobService::fail_job(job_id, "Job exceeded its maximum run time", config).await?;
            return Ok(());
        }

        let message = SequencerQueueMessage { job_id: job_id.to_string() };
        config.queue().send_message(QueueType::SequencerRun, serde_json::to_string(&message)?, None).await?;
        info!("Run budget exhausted, job handed over to a new run");
        Ok(())
    }
}

/// `base * 2^(attempt - 1)`, saturating.
pub fn retry_backoff(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1u32 << exponent)
}
