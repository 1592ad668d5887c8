use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::jobs::job_item::JobItem;
use crate::types::steps::types::{StepStatus, StepTask};
use crate::utils::helpers::generate_step_id;

/// One schedulable unit of a job's reduction tree.
///
/// Leaf steps use their transaction index as `step_id`. Merge steps get a
/// random id. `origins` lists the transaction indices the step's proof
/// covers, in left-to-right order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepItem {
    pub job_id: String,
    pub step_id: String,
    pub owner_id: String,
    pub developer: String,
    pub repo: String,
    pub job_task: String,
    pub args: Option<String>,
    pub metadata: Option<String>,
    pub worker_version: Option<String>,
    pub chain: String,
    pub task: StepTask,
    pub origins: Vec<String>,
    pub step_data: Vec<String>,
    pub result: Option<String>,
    pub status: StepStatus,
    pub attempts: u32,
    /// Highest attempt count seen on this step or any step folded into it
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    /// Compute time of the steps folded into this one, in milliseconds
    pub billed_duration: u64,
    #[serde(default)]
    pub logs: Vec<String>,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

impl StepItem {
    /// Leaf step for transaction `index` of `job`.
    pub fn leaf(job: &JobItem, index: u64, transaction: String) -> Self {
        let now = Utc::now();
        Self {
            job_id: job.id.clone(),
            step_id: index.to_string(),
            owner_id: job.owner_id.clone(),
            developer: job.developer.clone(),
            repo: job.repo.clone(),
            job_task: job.task.clone(),
            args: job.args.clone(),
            metadata: job.metadata.clone(),
            worker_version: job.worker_version.clone(),
            chain: job.chain.clone(),
            task: StepTask::Create,
            origins: vec![index.to_string()],
            step_data: vec![transaction],
            result: None,
            status: StepStatus::Created,
            attempts: 0,
            max_attempts: 0,
            created_at: now,
            started_at: None,
            finished_at: None,
            failed_at: None,
            billed_duration: 0,
            logs: Vec::new(),
            version: 0,
            updated_at: now,
        }
    }

    /// Merge step folding `left` and `right`, in that order.
    ///
    /// Callers must have validated that both steps carry a result and
    /// timestamps, see [`StepItem::compute_time_ms`].
    pub fn merge(left: &StepItem, right: &StepItem) -> Self {
        let now = Utc::now();
        let mut origins = left.origins.clone();
        origins.extend(right.origins.iter().cloned());
        let mut logs = left.logs.clone();
        logs.extend(right.logs.iter().cloned());
        let billed_duration = left.billed_duration
            + left.compute_time_ms().unwrap_or_default()
            + right.billed_duration
            + right.compute_time_ms().unwrap_or_default();

        Self {
            job_id: left.job_id.clone(),
            step_id: generate_step_id(),
            owner_id: left.owner_id.clone(),
            developer: left.developer.clone(),
            repo: left.repo.clone(),
            job_task: left.job_task.clone(),
            args: left.args.clone(),
            metadata: left.metadata.clone(),
            worker_version: left.worker_version.clone(),
            chain: left.chain.clone(),
            task: StepTask::Merge,
            origins,
            step_data: vec![left.result.clone().unwrap_or_default(), right.result.clone().unwrap_or_default()],
            result: None,
            status: StepStatus::Created,
            attempts: 0,
            max_attempts: left.attempts.max(left.max_attempts).max(right.attempts.max(right.max_attempts)),
            created_at: now,
            started_at: None,
            finished_at: None,
            failed_at: None,
            billed_duration,
            logs,
            version: 0,
            updated_at: now,
        }
    }

    /// Time between start and finish of this step's own worker call.
    pub fn compute_time_ms(&self) -> Option<u64> {
        match (self.started_at, self.finished_at) {
            (Some(started), Some(finished)) => Some((finished - started).num_milliseconds().max(0) as u64),
            _ => None,
        }
    }

    /// Lowest and highest covered transaction index, `None` when an origin is
    /// not a number or the step covers nothing.
    pub fn origin_bounds(&self) -> Option<(u64, u64)> {
        let mut bounds: Option<(u64, u64)> = None;
        for origin in &self.origins {
            let index: u64 = origin.parse().ok()?;
            bounds = Some(match bounds {
                None => (index, index),
                Some((low, high)) => (low.min(index), high.max(index)),
            });
        }
        bounds
    }

    /// True when `origins` covers every index in `[0, tx_number)` exactly once.
    pub fn covers_all(&self, tx_number: u64) -> bool {
        if self.origins.len() as u64 != tx_number {
            return false;
        }
        let mut indices = Vec::with_capacity(self.origins.len());
        for origin in &self.origins {
            match origin.parse::<u64>() {
                Ok(index) => indices.push(index),
                Err(_) => return false,
            }
        }
        indices.sort_unstable();
        indices.iter().enumerate().all(|(position, index)| position as u64 == *index)
    }
}

/// Reduced projection used by the health check.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StepHealthView {
    pub step_id: String,
    pub task: StepTask,
    pub status: StepStatus,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Time of the last status change, which dates a claim
    pub updated_at: DateTime<Utc>,
}

impl From<&StepItem> for StepHealthView {
    fn from(step: &StepItem) -> Self {
        Self {
            step_id: step.step_id.clone(),
            task: step.task,
            status: step.status,
            attempts: step.attempts,
            created_at: step.created_at,
            started_at: step.started_at,
            updated_at: step.updated_at,
        }
    }
}
