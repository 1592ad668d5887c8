use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Existence record written once a step's finished result is durable.
/// The sequencer polls markers instead of scanning step bodies.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProofMarker {
    pub job_id: String,
    pub step_id: String,
    pub created_at: DateTime<Utc>,
}

impl ProofMarker {
    pub fn new(job_id: &str, step_id: &str) -> Self {
        Self { job_id: job_id.to_string(), step_id: step_id.to_string(), created_at: Utc::now() }
    }
}
