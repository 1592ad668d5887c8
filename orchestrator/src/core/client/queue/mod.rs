pub mod error;
pub mod memory;
pub mod sqs;

use std::time::Duration;

use async_trait::async_trait;
pub use error::QueueError;
use omniqueue::Delivery;

use crate::types::queue::QueueType;

/// Fire-and-forget dispatcher. Delivery is at least once, so every consumer
/// of these messages must be idempotent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send_message(&self, queue: QueueType, payload: String, delay: Option<Duration>) -> Result<(), QueueError>;
    /// Next pending delivery. An empty queue yields
    /// `QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData)`.
    async fn consume_message_from_queue(&self, queue: QueueType) -> Result<Delivery, QueueError>;
}
