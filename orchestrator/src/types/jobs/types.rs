use serde::{Deserialize, Serialize};

/// Lifecycle of a proof job. The serialized form is the wire vocabulary
/// returned by the status endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the submission path, leaf steps not yet dispatched
    Created,
    /// Leaf steps were dispatched and the sequencer is reducing them
    Started,
    /// The final proof has been stored on the job
    Finished,
    /// The job hit an unrecoverable error or ran out of time
    Failed,
    /// A caller read the finished result at least once
    Used,
}

impl JobStatus {
    /// A job in a terminal status is never advanced by the sequencer again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed | JobStatus::Used)
    }
}

/// Progress of the one charge a job gets when it finishes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChargeStatus {
    /// Recorded right before the charge is issued
    Pending,
    /// The billing service accepted the charge
    Charged,
    /// The billing service refused the charge, so it may be issued again
    Rejected,
}
