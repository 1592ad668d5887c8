use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepStatus {
    Created,
    Started,
    Finished,
    Failed,
    /// Claimed by a sequencer iteration, either for a merge or for finalization
    Used,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StepTask {
    /// Leaf step, proves a single transaction
    Create,
    /// Internal step, folds two adjacent proofs into one
    Merge,
}

impl StepTask {
    /// Number of `step_data` entries the worker call needs.
    pub fn arity(&self) -> usize {
        match self {
            StepTask::Create => 1,
            StepTask::Merge => 2,
        }
    }
}
