//! Dispatcher backed by omniqueue's in-memory backend, one channel per
//! queue type. Delays are accepted but ignored.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use omniqueue::backends::{InMemoryBackend, InMemoryConsumer, InMemoryProducer};
use omniqueue::Delivery;
use strum::IntoEnumIterator;
use tokio::sync::Mutex;

use crate::core::client::queue::{QueueClient, QueueError};
use crate::types::queue::QueueType;

const RECEIVE_DEADLINE: Duration = Duration::from_millis(10);

struct MemoryChannel {
    producer: InMemoryProducer,
    consumer: Mutex<InMemoryConsumer>,
}

pub struct MemoryQueue {
    channels: HashMap<QueueType, MemoryChannel>,
}

impl MemoryQueue {
    pub async fn new() -> Result<Self, QueueError> {
        let mut channels = HashMap::new();
        for queue_type in QueueType::iter() {
            let (producer, consumer) = InMemoryBackend::builder().build_pair().await?;
            channels.insert(queue_type, MemoryChannel { producer, consumer: Mutex::new(consumer) });
        }
        Ok(Self { channels })
    }

    fn channel(&self, queue: &QueueType) -> Result<&MemoryChannel, QueueError> {
        self.channels.get(queue).ok_or(QueueError::QueueNotConfigured(*queue))
    }

    /// Takes every pending payload off `queue`, acknowledging each delivery.
    pub async fn drain(&self, queue: QueueType) -> Result<Vec<String>, QueueError> {
        let mut payloads = Vec::new();
        loop {
            match self.consume_message_from_queue(queue).await {
                Ok(delivery) => {
                    let payload = delivery.borrow_payload().map(|p| String::from_utf8_lossy(p).to_string());
                    delivery.ack().await.map_err(|(e, _)| QueueError::ErrorFromQueueError(e))?;
                    if let Some(payload) = payload {
                        payloads.push(payload);
                    }
                }
                Err(QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData)) => return Ok(payloads),
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn send_message(&self, queue: QueueType, payload: String, delay: Option<Duration>) -> Result<(), QueueError> {
        if let Some(delay) = delay {
            tracing::debug!(queue = %queue, delay_ms = delay.as_millis() as u64, "Ignoring delay on in-memory queue");
        }
        self.channel(&queue)?.producer.send_raw(&payload.into_bytes()).await?;
        Ok(())
    }

    async fn consume_message_from_queue(&self, queue: QueueType) -> Result<Delivery, QueueError> {
        let mut consumer = self.channel(&queue)?.consumer.lock().await;
        let mut deliveries = consumer.receive_all(1, RECEIVE_DEADLINE).await?;
        deliveries.pop().ok_or(QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData))
    }
}
