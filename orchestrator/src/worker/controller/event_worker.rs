use std::sync::Arc;
use std::time::{Duration, Instant};

use omniqueue::Delivery;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::core::client::queue::QueueError;
use crate::core::config::Config;
use crate::error::event::EventSystemResult;
use crate::error::ConsumptionError;
use crate::sequencer::Sequencer;
use crate::types::queue::{QueueType, SequencerQueueMessage, StepQueueMessage};
use crate::worker::step_runner::StepRunner;
use crate::worker::traits::message::{MessageParser, ParsedMessage};

const QUEUE_GET_MESSAGE_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const QUEUE_NO_MESSAGE_SLEEP_DURATION: Duration = Duration::from_millis(1000);

/// Long-lived consumer of one queue. Runs up to `max_concurrent_tasks`
/// handlers at once, acks a delivery when its handler succeeds and nacks it
/// otherwise.
#[derive(Clone)]
pub struct EventWorker {
    config: Arc<Config>,
    queue_type: QueueType,
    max_concurrent_tasks: usize,
    cancellation_token: CancellationToken,
}

impl EventWorker {
    pub fn new(queue_type: QueueType, config: Arc<Config>, cancellation_token: CancellationToken) -> Self {
        let max_concurrent_tasks = match queue_type {
            QueueType::StepRun => config.service_config().max_concurrent_steps,
            QueueType::SequencerStart | QueueType::SequencerRun => config.service_config().max_concurrent_sequencers,
        };
        Self { config, queue_type, max_concurrent_tasks, cancellation_token }
    }

    /// Triggers a graceful shutdown
    pub async fn shutdown(&self) -> EventSystemResult<()> {
        info!("Triggering shutdown for {} worker", self.queue_type);
        self.cancellation_token.cancel();
        Ok(())
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    fn create_job_span(&self, parsed_message: &ParsedMessage) -> Span {
        match parsed_message {
            ParsedMessage::Step(msg) => {
                tracing::info_span!("step_run", job_id = %msg.job_id, step_id = %msg.step_id, chain = %msg.chain)
            }
            ParsedMessage::Sequencer(msg) => {
                tracing::info_span!("sequencer", job_id = %msg.job_id, queue = %self.queue_type)
            }
        }
    }

    /// Waits up to [`QUEUE_GET_MESSAGE_WAIT_TIMEOUT`] for the next delivery.
    pub async fn get_message(&self) -> EventSystemResult<Option<Delivery>> {
        let start = Instant::now();

        loop {
            match self.config.queue().consume_message_from_queue(self.queue_type).await {
                Ok(delivery) => return Ok(Some(delivery)),
                Err(QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData)) => {
                    if start.elapsed() > QUEUE_GET_MESSAGE_WAIT_TIMEOUT {
                        return Ok(None);
                    }
                    sleep(QUEUE_NO_MESSAGE_SLEEP_DURATION).await;
                }
                Err(e) => {
                    error!(queue = %self.queue_type, error = %e, "Failed to consume message from queue");
                    return Err(ConsumptionError::FailedToConsumeFromQueue { error_msg: e.to_string() })?;
                }
            }
        }
    }

    pub fn parse_message(&self, message: &Delivery) -> EventSystemResult<ParsedMessage> {
        match self.queue_type {
            QueueType::StepRun => StepQueueMessage::parse_message(message).map(ParsedMessage::Step),
            QueueType::SequencerStart | QueueType::SequencerRun => {
                SequencerQueueMessage::parse_message(message).map(ParsedMessage::Sequencer)
            }
        }
    }

    pub async fn handle_message(&self, message: &ParsedMessage) -> EventSystemResult<()> {
        match (self.queue_type, message) {
            (QueueType::StepRun, ParsedMessage::Step(msg)) => {
                StepRunner::run_step(&msg.job_id, &msg.step_id, self.config.clone()).await?
            }
            (QueueType::SequencerStart, ParsedMessage::Sequencer(msg)) => {
                Sequencer::start_job(&msg.job_id, self.config.clone()).await?
            }
            (QueueType::SequencerRun, ParsedMessage::Sequencer(msg)) => {
                Sequencer::run(&msg.job_id, self.config.clone()).await?
            }
            (queue, _) => {
                return Err(ConsumptionError::FailedToHandleJob {
                    job_id: message.job_id().to_string(),
                    error_msg: format!("Unexpected message kind on queue {}", queue),
                })?;
            }
        }
        Ok(())
    }

    /// Acks the delivery when `result` is a success, nacks it otherwise.
    async fn post_processing(
        &self,
        result: EventSystemResult<()>,
        message: Delivery,
        parsed_message: &ParsedMessage,
    ) -> EventSystemResult<()> {
        if let Err(ref error) = result {
            let job_id = parsed_message.job_id();
            error!(job_id = %job_id, error = %error, "Failed to handle message");

            message.nack().await.map_err(|e| ConsumptionError::FailedToAcknowledgeMessage(e.0.to_string()))?;

            return Err(ConsumptionError::FailedToHandleJob { job_id: job_id.to_string(), error_msg: error.to_string() })?;
        }

        message.ack().await.map_err(|e| ConsumptionError::FailedToAcknowledgeMessage(e.0.to_string()))?;
        Ok(())
    }

    pub async fn process_message(&self, message: Delivery, parsed_message: ParsedMessage) -> EventSystemResult<()> {
        let span = self.create_job_span(&parsed_message);
        async move {
            let result = self.handle_message(&parsed_message).await;
            self.post_processing(result, message, &parsed_message).await
        }
        .instrument(span)
        .await
    }

    /// Consumes the queue until the cancellation token fires, then waits for
    /// in-flight handlers.
    pub async fn run(&self) -> EventSystemResult<()> {
        let mut tasks = JoinSet::new();
        info!("Starting {} worker (pool_size={})", self.queue_type, self.max_concurrent_tasks);

        loop {
            if self.is_shutdown_requested() {
                info!("Shutdown requested, stopping message processing");
                break;
            }

            tokio::select! {
                biased;

                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::handle_task_result(result);
                }

                _ = self.cancellation_token.cancelled() => {
                    info!("Shutdown signal received, breaking from main loop");
                    break;
                }

                message_result = self.get_message(), if tasks.len() < self.max_concurrent_tasks => {
                    match message_result {
                        Ok(Some(message)) => match self.parse_message(&message) {
                            Ok(parsed_message) => {
                                debug!(queue = %self.queue_type, job_id = %parsed_message.job_id(), "Received message from queue");
                                let worker = self.clone();
                                tasks.spawn(async move { worker.process_message(message, parsed_message).await });
                            }
                            Err(e) => {
                                warn!(queue = %self.queue_type, error = %e, "Dropping unparseable message");
                                if let Err((ack_error, _)) = message.ack().await {
                                    error!(error = %ack_error, "Failed to ack unparseable message");
                                }
                            }
                        },
                        Ok(None) => sleep(QUEUE_NO_MESSAGE_SLEEP_DURATION).await,
                        Err(e) => {
                            error!(error = %e, "Error receiving message");
                            sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }

        info!("Waiting for {} remaining tasks to complete", tasks.len());
        while let Some(result) = tasks.join_next().await {
            Self::handle_task_result(result);
        }
        info!("All tasks completed, worker shutdown complete");

        Ok(())
    }

    fn handle_task_result(result: Result<EventSystemResult<()>, tokio::task::JoinError>) {
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("Task failed with application error: {:?}", e);
            }
            Err(e) => {
                error!("Task panicked or was cancelled: {:?}", e);
            }
        }
    }
}
