use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::config::Config;
use crate::error::job::JobResult;
use crate::sequencer::Sequencer;
use crate::types::params::sequencer::SequencerParams;
use crate::types::steps::step_item::StepHealthView;
use crate::types::steps::types::{StepStatus, StepTask};

/// A step that sat in one status for longer than allowed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StuckStep {
    pub step_id: String,
    pub task: StepTask,
    pub status: StepStatus,
    pub attempts: u32,
    /// Time spent in the current status
    pub elapsed_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub job_id: String,
    pub checked_at: DateTime<Utc>,
    pub total_steps: usize,
    pub stuck: Vec<StuckStep>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.stuck.is_empty()
    }
}

/// Decides what happens to stuck steps. The health check itself never
/// mutates a job or a step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StuckStepPolicy: Send + Sync {
    async fn on_unhealthy(&self, job_id: &str, report: &HealthReport) -> JobResult<()>;
}

/// Leaves stuck steps alone. They are already logged by the health check.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyPolicy;

#[async_trait]
impl StuckStepPolicy for LogOnlyPolicy {
    async fn on_unhealthy(&self, job_id: &str, report: &HealthReport) -> JobResult<()> {
        debug!(job_id = %job_id, stuck = report.stuck.len(), "No remediation for stuck steps");
        Ok(())
    }
}

/// Steps among `views` that exceeded their budget at `now`.
///
/// A `created` step is measured from creation and a `started` step from its
/// start. A `used` step is measured from its claim: a claim is settled within
/// one iteration, so one held longer than the start budget was orphaned.
pub fn find_stuck_steps(views: &[StepHealthView], params: &SequencerParams, now: DateTime<Utc>) -> Vec<StuckStep> {
    let max_start_ms = params.max_step_start_time.as_millis() as i64;
    let max_run_ms = params.max_step_run_time.as_millis() as i64;

    views
        .iter()
        .filter_map(|view| {
            let (since, limit) = match (view.status, view.started_at) {
                (StepStatus::Created, _) => (view.created_at, max_start_ms),
                (StepStatus::Started, Some(started_at)) => (started_at, max_run_ms),
                (StepStatus::Used, _) => (view.updated_at, max_start_ms),
                _ => return None,
            };
            let elapsed_ms = (now - since).num_milliseconds();
            (elapsed_ms > limit).then(|| StuckStep {
                step_id: view.step_id.clone(),
                task: view.task,
                status: view.status,
                attempts: view.attempts,
                elapsed_ms,
            })
        })
        .collect()
}

impl Sequencer {
    /// Flags steps that overran their budget and hands them to the
    /// configured [`StuckStepPolicy`].
    #[instrument(skip(config), fields(job_id = %job_id))]
    pub async fn check_health(job_id: &str, config: &Config) -> JobResult<HealthReport> {
        let views = config.database().get_step_health(job_id).await?;
        let now = Utc::now();
        let stuck = find_stuck_steps(&views, config.sequencer_params(), now);

        let report = HealthReport { job_id: job_id.to_string(), checked_at: now, total_steps: views.len(), stuck };
        if report.is_healthy() {
            debug!(steps = report.total_steps, "All steps healthy");
            return Ok(report);
        }

        for step in &report.stuck {
            warn!(
                step_id = %step.step_id,
                task = %step.task,
                status = %step.status,
                attempts = step.attempts,
                elapsed_ms = step.elapsed_ms,
                "Step is stuck"
            );
        }

        config.stuck_step_policy().on_unhealthy(job_id, &report).await?;
        Ok(report)
    }
}
