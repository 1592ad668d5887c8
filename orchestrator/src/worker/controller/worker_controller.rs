use std::sync::{Arc, Mutex};

use futures::future::try_join_all;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::core::config::Config;
use crate::error::event::{EventSystemError, EventSystemResult};
use crate::types::queue::QueueType;
use crate::worker::controller::event_worker::EventWorker;

/// Runs one [`EventWorker`] per queue type.
#[derive(Clone)]
pub struct WorkerController {
    config: Arc<Config>,
    workers: Arc<Mutex<Vec<Arc<EventWorker>>>>,
    cancellation_token: CancellationToken,
}

impl WorkerController {
    pub fn new(config: Arc<Config>, cancellation_token: CancellationToken) -> Self {
        Self { config, workers: Arc::new(Mutex::new(Vec::new())), cancellation_token }
    }

    pub fn workers(&self) -> EventSystemResult<Vec<Arc<EventWorker>>> {
        let workers = self.workers.lock().map_err(|e| EventSystemError::MutexPoisonError(e.to_string()))?;
        Ok(workers.clone())
    }

    /// Spawns a worker for every queue and waits for all of them. Returns on
    /// graceful shutdown, or with the first infrastructure error.
    pub async fn run(&self) -> EventSystemResult<()> {
        let mut worker_set = tokio::task::JoinSet::new();
        for queue_type in QueueType::iter() {
            let self_clone = self.clone();
            worker_set.spawn(async move { self_clone.create_span(&queue_type).await });
        }
        while let Some(result) = worker_set.join_next().await {
            result.map_err(|e| EventSystemError::TaskJoinError(e.to_string()))??;
        }
        Ok(())
    }

    fn create_event_handler(&self, queue_type: &QueueType) -> EventSystemResult<Arc<EventWorker>> {
        let worker_token = self.cancellation_token.child_token();
        let worker = Arc::new(EventWorker::new(*queue_type, self.config.clone(), worker_token));

        let mut workers = self.workers.lock().map_err(|e| EventSystemError::MutexPoisonError(e.to_string()))?;
        workers.push(worker.clone());
        drop(workers);

        Ok(worker)
    }

    async fn create_span(&self, q: &QueueType) -> EventSystemResult<()> {
        let span = info_span!("worker", q = %q);

        async move {
            let handler = self.create_event_handler(q)?;

            match handler.run().await {
                Ok(_) => {
                    warn!("Worker for queue type {} completed (this is normal during shutdown)", q);
                    Ok(())
                }
                Err(e) => {
                    error!("Worker for queue type {} failed with infrastructure error: {:?}", q, e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Signals every worker to stop once its in-flight handlers complete.
    pub async fn shutdown(&self) -> EventSystemResult<()> {
        info!("Initiating WorkerController graceful shutdown");

        let workers = self.workers()?;
        info!("Signaling {} workers to shutdown gracefully", workers.len());

        let futures: Vec<_> = workers.iter().map(|worker| worker.shutdown()).collect();
        try_join_all(futures).await?;
        info!("WorkerController shutdown completed");
        Ok(())
    }
}
