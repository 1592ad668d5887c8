use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::types::constant::JOB_ID_SUFFIX_LENGTH;

/// Millisecond timestamp followed by a random lowercase alphanumeric suffix.
pub fn generate_job_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(JOB_ID_SUFFIX_LENGTH)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}

pub fn generate_step_id() -> String {
    Uuid::new_v4().simple().to_string()
}
