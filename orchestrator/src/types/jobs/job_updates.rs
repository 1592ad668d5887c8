use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::job::JobError;
use crate::types::jobs::types::{ChargeStatus, JobStatus};

/// Defining a structure that contains the changes to be made in the job object,
/// id, owner and created at are not allowed to be changed
// version and updated_at will always be updated when this object updates the job
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct JobItemUpdates {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub billed_duration: Option<u64>,
    pub charge_status: Option<ChargeStatus>,
    pub logs: Option<Vec<String>>,
    pub result: Option<String>,
}

impl JobItemUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_status(mut self, status: JobStatus) -> JobItemUpdates {
        self.status = Some(status);
        self
    }
    pub fn update_started_at(mut self, started_at: DateTime<Utc>) -> JobItemUpdates {
        self.started_at = Some(started_at);
        self
    }
    pub fn update_finished_at(mut self, finished_at: DateTime<Utc>) -> JobItemUpdates {
        self.finished_at = Some(finished_at);
        self
    }
    pub fn update_failed_at(mut self, failed_at: DateTime<Utc>) -> JobItemUpdates {
        self.failed_at = Some(failed_at);
        self
    }
    pub fn update_used_at(mut self, used_at: DateTime<Utc>) -> JobItemUpdates {
        self.used_at = Some(used_at);
        self
    }
    pub fn update_billed_duration(mut self, billed_duration: u64) -> JobItemUpdates {
        self.billed_duration = Some(billed_duration);
        self
    }
    pub fn update_charge_status(mut self, charge_status: ChargeStatus) -> JobItemUpdates {
        self.charge_status = Some(charge_status);
        self
    }
    pub fn update_logs(mut self, logs: Vec<String>) -> JobItemUpdates {
        self.logs = Some(logs);
        self
    }
    pub fn update_result(mut self, result: String) -> JobItemUpdates {
        self.result = Some(result);
        self
    }

    pub fn build(self) -> Result<JobItemUpdates, JobError> {
        if self == JobItemUpdates::default() {
            Err(JobError::Other("No field to be updated, likely a false call".to_string()))
        } else {
            Ok(self)
        }
    }
}
