//! In-process store used by tests and local runs.
//!
//! Every operation takes the single state lock, so the conditional updates
//! are atomic exactly like their MongoDB counterparts. Nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::DatabaseError;
use crate::core::client::database::DatabaseClient;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::proof_marker::ProofMarker;
use crate::types::steps::step_item::{StepHealthView, StepItem};
use crate::types::steps::step_updates::StepItemUpdates;
use crate::types::steps::types::StepStatus;

type StepKey = (String, String);

#[derive(Debug, Default)]
struct MemoryState {
    jobs: HashMap<String, JobItem>,
    steps: BTreeMap<StepKey, StepItem>,
    markers: Vec<ProofMarker>,
}

fn poison_err<T>(_: PoisonError<T>) -> DatabaseError {
    DatabaseError::LockPoisoned("memory database lock poisoned".to_string())
}

fn step_key(job_id: &str, step_id: &str) -> StepKey {
    (job_id.to_string(), step_id.to_string())
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: RwLock<MemoryState>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// All steps currently stored for `job_id`, ordered by step id.
    pub fn steps_of(&self, job_id: &str) -> Result<Vec<StepItem>, DatabaseError> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.steps.values().filter(|step| step.job_id == job_id).cloned().collect())
    }

    fn swap_step_status(
        &self,
        job_id: &str,
        step_id: &str,
        expected: StepStatus,
        new: StepStatus,
    ) -> Result<Option<StepItem>, DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        match state.steps.get_mut(&step_key(job_id, step_id)) {
            Some(step) if step.status == expected => {
                step.status = new;
                step.version += 1;
                step.updated_at = Utc::now();
                Ok(Some(step.clone()))
            }
            _ => Ok(None),
        }
    }
}

fn apply_job_updates(job: &mut JobItem, update: JobItemUpdates) {
    let JobItemUpdates {
        status,
        started_at,
        finished_at,
        failed_at,
        used_at,
        billed_duration,
        charge_status,
        logs,
        result,
    } = update;
    if let Some(status) = status {
        job.status = status;
    }
    if started_at.is_some() {
        job.started_at = started_at;
    }
    if finished_at.is_some() {
        job.finished_at = finished_at;
    }
    if failed_at.is_some() {
        job.failed_at = failed_at;
    }
    if used_at.is_some() {
        job.used_at = used_at;
    }
    if billed_duration.is_some() {
        job.billed_duration = billed_duration;
    }
    if charge_status.is_some() {
        job.charge_status = charge_status;
    }
    if let Some(logs) = logs {
        job.logs = logs;
    }
    if result.is_some() {
        job.result = result;
    }
}

fn apply_step_updates(step: &mut StepItem, update: StepItemUpdates) {
    let StepItemUpdates { status, attempts, result, started_at, finished_at, failed_at, logs } = update;
    if let Some(status) = status {
        step.status = status;
    }
    if let Some(attempts) = attempts {
        step.attempts = attempts;
    }
    if result.is_some() {
        step.result = result;
    }
    if started_at.is_some() {
        step.started_at = started_at;
    }
    if finished_at.is_some() {
        step.finished_at = finished_at;
    }
    if failed_at.is_some() {
        step.failed_at = failed_at;
    }
    if let Some(logs) = logs {
        step.logs = logs;
    }
}

#[async_trait]
impl DatabaseClient for MemoryDatabase {
    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        if state.jobs.contains_key(&job.id) {
            return Err(DatabaseError::ItemAlreadyExists(format!("Job already exists for id {}", job.id)));
        }
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobItem>, DatabaseError> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.jobs.get(id).cloned())
    }

    async fn update_job(&self, current: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError> {
        if update == JobItemUpdates::default() {
            return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
        }
        let mut state = self.state.write().map_err(poison_err)?;
        match state.jobs.get_mut(&current.id) {
            Some(job) if job.version == current.version => {
                apply_job_updates(job, update);
                job.version += 1;
                job.updated_at = Utc::now();
                Ok(job.clone())
            }
            _ => Err(DatabaseError::UpdateFailed(format!("Failed to update job. Identifier - {}", current.id))),
        }
    }

    async fn update_job_status_if(
        &self,
        id: &str,
        expected: JobStatus,
        new: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<JobItem>, DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        match state.jobs.get_mut(id) {
            Some(job) if job.status == expected => {
                job.status = new;
                match new {
                    JobStatus::Created => {}
                    JobStatus::Started => job.started_at = Some(at),
                    JobStatus::Finished => job.finished_at = Some(at),
                    JobStatus::Failed => job.failed_at = Some(at),
                    JobStatus::Used => job.used_at = Some(at),
                }
                job.version += 1;
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn create_step(&self, step: StepItem) -> Result<StepItem, DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        let key = step_key(&step.job_id, &step.step_id);
        if state.steps.contains_key(&key) {
            return Err(DatabaseError::ItemAlreadyExists(format!(
                "Step {} already exists for job {}",
                step.step_id, step.job_id
            )));
        }
        state.steps.insert(key, step.clone());
        Ok(step)
    }

    async fn get_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.steps.get(&step_key(job_id, step_id)).cloned())
    }

    async fn update_step(&self, current: &StepItem, update: StepItemUpdates) -> Result<StepItem, DatabaseError> {
        if update == StepItemUpdates::default() {
            return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
        }
        let mut state = self.state.write().map_err(poison_err)?;
        match state.steps.get_mut(&step_key(&current.job_id, &current.step_id)) {
            Some(step) if step.version == current.version => {
                apply_step_updates(step, update);
                step.version += 1;
                step.updated_at = Utc::now();
                Ok(step.clone())
            }
            _ => Err(DatabaseError::UpdateFailed(format!(
                "Failed to update step. Identifier - {}/{}",
                current.job_id, current.step_id
            ))),
        }
    }

    async fn delete_step(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.steps.remove(&step_key(job_id, step_id));
        Ok(())
    }

    async fn claim_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        self.swap_step_status(job_id, step_id, StepStatus::Finished, StepStatus::Used)
    }

    async fn release_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        self.swap_step_status(job_id, step_id, StepStatus::Used, StepStatus::Finished)
    }

    async fn get_step_health(&self, job_id: &str) -> Result<Vec<StepHealthView>, DatabaseError> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.steps.values().filter(|step| step.job_id == job_id).map(StepHealthView::from).collect())
    }

    async fn create_proof_marker(&self, marker: ProofMarker) -> Result<(), DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        let exists = state.markers.iter().any(|m| m.job_id == marker.job_id && m.step_id == marker.step_id);
        if !exists {
            state.markers.push(marker);
        }
        Ok(())
    }

    async fn get_proof_markers(&self, job_id: &str) -> Result<Vec<ProofMarker>, DatabaseError> {
        let state = self.state.read().map_err(poison_err)?;
        Ok(state.markers.iter().filter(|m| m.job_id == job_id).cloned().collect())
    }

    async fn delete_proof_marker(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write().map_err(poison_err)?;
        state.markers.retain(|m| !(m.job_id == job_id && m.step_id == step_id));
        Ok(())
    }
}
