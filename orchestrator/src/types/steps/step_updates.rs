use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::job::JobError;
use crate::types::steps::types::StepStatus;

/// Changes to apply to a step; identity, origins and inputs never change.
// version and updated_at will always be updated when this object updates the step
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct StepItemUpdates {
    pub status: Option<StepStatus>,
    pub attempts: Option<u32>,
    pub result: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub logs: Option<Vec<String>>,
}

impl StepItemUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_status(mut self, status: StepStatus) -> StepItemUpdates {
        self.status = Some(status);
        self
    }
    pub fn update_attempts(mut self, attempts: u32) -> StepItemUpdates {
        self.attempts = Some(attempts);
        self
    }
    pub fn update_result(mut self, result: String) -> StepItemUpdates {
        self.result = Some(result);
        self
    }
    pub fn update_started_at(mut self, started_at: DateTime<Utc>) -> StepItemUpdates {
        self.started_at = Some(started_at);
        self
    }
    pub fn update_finished_at(mut self, finished_at: DateTime<Utc>) -> StepItemUpdates {
        self.finished_at = Some(finished_at);
        self
    }
    pub fn update_failed_at(mut self, failed_at: DateTime<Utc>) -> StepItemUpdates {
        self.failed_at = Some(failed_at);
        self
    }
    pub fn update_logs(mut self, logs: Vec<String>) -> StepItemUpdates {
        self.logs = Some(logs);
        self
    }

    pub fn build(self) -> Result<StepItemUpdates, JobError> {
        if self == StepItemUpdates::default() {
            Err(JobError::Other("No field to be updated, likely a false call".to_string()))
        } else {
            Ok(self)
        }
    }
}
