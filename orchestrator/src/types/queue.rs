use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Dispatcher targets.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash)]
pub enum QueueType {
    /// Run one step against its worker
    #[strum(serialize = "step_run")]
    StepRun,
    /// Create the leaf steps of a freshly submitted job
    #[strum(serialize = "sequencer_start")]
    SequencerStart,
    /// Continue the reduction loop of a started job
    #[strum(serialize = "sequencer_run")]
    SequencerRun,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StepQueueMessage {
    pub job_id: String,
    pub step_id: String,
    pub chain: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SequencerQueueMessage {
    pub job_id: String,
}
