use thiserror::Error;

use crate::types::queue::QueueType;

#[derive(Error, Debug)]
pub enum ConsumptionError {
    #[error("Failed to consume message from queue, error {error_msg:?}")]
    FailedToConsumeFromQueue { error_msg: String },

    #[error("Failed to handle message for job {job_id:?}. Error: {error_msg:?}")]
    FailedToHandleJob { job_id: String, error_msg: String },

    #[error("Failed to acknowledge the message: {0}")]
    FailedToAcknowledgeMessage(String),

    #[error("Queue {0} has no consumer configured")]
    QueueNotFound(QueueType),

    #[error("Empty payload received on queue {0}")]
    EmptyPayload(QueueType),
}
