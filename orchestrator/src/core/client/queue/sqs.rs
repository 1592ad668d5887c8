use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::Client;
use omniqueue::backends::{SqsBackend, SqsConfig, SqsConsumer};
use omniqueue::Delivery;

use crate::core::client::queue::{QueueClient, QueueError};
use crate::types::params::QueueArgs;
use crate::types::queue::QueueType;

#[derive(Clone, Debug)]
pub struct SQS {
    client: Client,
    queue_template: String,
}

impl SQS {
    pub fn new(aws_config: &SdkConfig, args: &QueueArgs) -> Self {
        let sqs_config = aws_sdk_sqs::config::Builder::from(aws_config).build();
        Self { client: Client::from_conf(sqs_config), queue_template: args.queue_template.clone() }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// get_queue_name - Get the queue specific name from its type
    /// The template contains "{}" which is replaced with the queue type
    pub fn get_queue_name(&self, queue_type: &QueueType) -> String {
        self.queue_template.replace("{}", &queue_type.to_string())
    }

    async fn get_queue_url(&self, queue_type: &QueueType) -> Result<String, QueueError> {
        let queue_name = self.get_queue_name(queue_type);
        Ok(self
            .client
            .get_queue_url()
            .queue_name(&queue_name)
            .send()
            .await?
            .queue_url()
            .ok_or_else(|| QueueError::FailedToGetQueueUrl(queue_name.clone()))?
            .to_string())
    }

    async fn get_consumer(&self, queue_url: String) -> Result<SqsConsumer, QueueError> {
        let consumer =
            SqsBackend::builder(SqsConfig { queue_dsn: queue_url, override_endpoint: false }).build_consumer().await?;
        Ok(consumer)
    }
}

#[async_trait]
impl QueueClient for SQS {
    async fn send_message(&self, queue: QueueType, payload: String, delay: Option<Duration>) -> Result<(), QueueError> {
        let queue_url = self.get_queue_url(&queue).await?;

        let mut send_message_request = self.client.send_message().queue_url(&queue_url).message_body(&payload);

        if let Some(delay_duration) = delay {
            send_message_request = send_message_request.delay_seconds(delay_duration.as_secs() as i32);
        }

        send_message_request.send().await?;

        tracing::debug!(queue = %queue, "Sent message to queue");

        Ok(())
    }

    async fn consume_message_from_queue(&self, queue: QueueType) -> Result<Delivery, QueueError> {
        let queue_url = self.get_queue_url(&queue).await?;
        let mut consumer = self.get_consumer(queue_url).await?;

        // zero wait: an empty queue is reported right away and polled again by the caller
        let mut deliveries = consumer.receive_all(1, Duration::ZERO).await?;
        deliveries.pop().ok_or_else(|| omniqueue::QueueError::NoData.into())
    }
}
