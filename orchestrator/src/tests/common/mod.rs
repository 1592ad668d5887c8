use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rstest::*;

use crate::core::client::billing::{BillingClient, BillingError, ChargeRequest};
use crate::core::client::database::memory::MemoryDatabase;
use crate::core::client::database::DatabaseError;
use crate::core::client::DatabaseClient;
use crate::core::client::worker::{ProofWorker, WorkerContext, WorkerError, WorkerRegistry};
use crate::sequencer::Sequencer;
use crate::tests::config::TestServices;
use crate::types::jobs::job_item::{JobItem, SubmitJobRequest};
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::JobStatus;
use crate::types::proof_marker::ProofMarker;
use crate::types::queue::{QueueType, SequencerQueueMessage, StepQueueMessage};
use crate::types::steps::step_item::{StepHealthView, StepItem};
use crate::types::steps::step_updates::StepItemUpdates;
use crate::types::steps::types::StepStatus;
use crate::worker::step_runner::StepRunner;

/// Transaction `index` as submitted by [`build_submit_request`].
pub fn transaction(index: usize) -> String {
    format!("[{}]", index)
}

#[fixture]
pub fn submit_request(#[default(3)] tx_number: usize) -> SubmitJobRequest {
    build_submit_request(tx_number)
}

pub fn build_submit_request(tx_number: usize) -> SubmitJobRequest {
    SubmitJobRequest {
        owner_id: "owner-1".to_string(),
        developer: "acme".to_string(),
        repo: "rollup".to_string(),
        task: "prove".to_string(),
        args: Some("--fast".to_string()),
        metadata: None,
        worker_version: Some("1.0.0".to_string()),
        chain: "devnet".to_string(),
        transactions: (0..tx_number).map(transaction).collect(),
        webhook: None,
    }
}

/// Job row of `tx_number` transactions, not yet stored.
pub fn build_job_item(tx_number: usize) -> JobItem {
    JobItem::from_request(&build_submit_request(tx_number))
}

/// Finished step covering `origins`, with a result and a 10ms compute time.
pub fn build_finished_step(job: &JobItem, origins: &[u64]) -> StepItem {
    let mut step = StepItem::leaf(job, origins[0], transaction(origins[0] as usize));
    step.origins = origins.iter().map(|o| o.to_string()).collect();
    step.step_id = origins.iter().map(|o| o.to_string()).collect::<Vec<_>>().join("-");
    step.status = StepStatus::Finished;
    step.attempts = 1;
    step.result = Some(origins.iter().map(|o| transaction(*o as usize)).collect());
    let started_at = Utc::now() - ChronoDuration::milliseconds(10);
    step.started_at = Some(started_at);
    step.finished_at = Some(started_at + ChronoDuration::milliseconds(10));
    step
}

/// Proves a transaction as itself and merges by concatenation, so a final
/// proof spells out the transactions in origin order.
#[derive(Debug, Default)]
pub struct ConcatWorker;

#[async_trait]
impl ProofWorker for ConcatWorker {
    async fn create(&self, input: &str) -> Result<Option<String>, WorkerError> {
        Ok(Some(input.to_string()))
    }

    async fn merge(&self, left: &str, right: &str) -> Result<Option<String>, WorkerError> {
        Ok(Some(format!("{}{}", left, right)))
    }
}

#[derive(Debug, Default)]
pub struct ConcatRegistry {
    pub restarts: Mutex<Vec<String>>,
}

#[async_trait]
impl WorkerRegistry for ConcatRegistry {
    async fn get_worker(&self, _context: &WorkerContext) -> Result<Arc<dyn ProofWorker>, WorkerError> {
        Ok(Arc::new(ConcatWorker))
    }

    async fn restart(&self, context: &WorkerContext, _reason: &str) -> Result<(), WorkerError> {
        self.restarts.lock().unwrap().push(context.step_id.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingBilling {
    pub charges: Mutex<Vec<ChargeRequest>>,
}

impl RecordingBilling {
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingClient for RecordingBilling {
    async fn charge(&self, request: ChargeRequest) -> Result<(), BillingError> {
        self.charges.lock().unwrap().push(request);
        Ok(())
    }
}

/// In-memory store whose `update_job` fails on the listed calls, counting
/// from 1. Every other operation goes straight to the in-memory store.
pub struct FlakyDatabase {
    inner: Arc<MemoryDatabase>,
    failing_job_updates: Vec<usize>,
    job_updates: AtomicUsize,
}

impl FlakyDatabase {
    pub fn failing_job_updates(inner: Arc<MemoryDatabase>, calls: &[usize]) -> Self {
        Self { inner, failing_job_updates: calls.to_vec(), job_updates: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DatabaseClient for FlakyDatabase {
    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError> {
        self.inner.create_job(job).await
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobItem>, DatabaseError> {
        self.inner.get_job(id).await
    }

    async fn update_job(&self, current: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError> {
        let call = self.job_updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_job_updates.contains(&call) {
            return Err(DatabaseError::LockPoisoned(format!("job update {} unavailable", call)));
        }
        self.inner.update_job(current, update).await
    }

    async fn update_job_status_if(
        &self,
        id: &str,
        expected: JobStatus,
        new: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<JobItem>, DatabaseError> {
        self.inner.update_job_status_if(id, expected, new, at).await
    }

    async fn create_step(&self, step: StepItem) -> Result<StepItem, DatabaseError> {
        self.inner.create_step(step).await
    }

    async fn get_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        self.inner.get_step(job_id, step_id).await
    }

    async fn update_step(&self, current: &StepItem, update: StepItemUpdates) -> Result<StepItem, DatabaseError> {
        self.inner.update_step(current, update).await
    }

    async fn delete_step(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        self.inner.delete_step(job_id, step_id).await
    }

    async fn claim_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        self.inner.claim_step(job_id, step_id).await
    }

    async fn release_step(&self, job_id: &str, step_id: &str) -> Result<Option<StepItem>, DatabaseError> {
        self.inner.release_step(job_id, step_id).await
    }

    async fn get_step_health(&self, job_id: &str) -> Result<Vec<StepHealthView>, DatabaseError> {
        self.inner.get_step_health(job_id).await
    }

    async fn create_proof_marker(&self, marker: ProofMarker) -> Result<(), DatabaseError> {
        self.inner.create_proof_marker(marker).await
    }

    async fn get_proof_markers(&self, job_id: &str) -> Result<Vec<ProofMarker>, DatabaseError> {
        self.inner.get_proof_markers(job_id).await
    }

    async fn delete_proof_marker(&self, job_id: &str, step_id: &str) -> Result<(), DatabaseError> {
        self.inner.delete_proof_marker(job_id, step_id).await
    }
}

/// Runs every pending `sequencer_start` delivery.
pub async fn run_pending_starts(services: &TestServices) {
    for payload in services.queue.drain(QueueType::SequencerStart).await.unwrap() {
        let message: SequencerQueueMessage = serde_json::from_str(&payload).unwrap();
        Sequencer::start_job(&message.job_id, services.config.clone()).await.unwrap();
    }
}

/// Runs every pending `step_run` delivery, returning how many ran.
pub async fn run_pending_steps(services: &TestServices) -> usize {
    let payloads = services.queue.drain(QueueType::StepRun).await.unwrap();
    for payload in &payloads {
        let message: StepQueueMessage = serde_json::from_str(payload).unwrap();
        StepRunner::run_step(&message.job_id, &message.step_id, services.config.clone()).await.unwrap();
    }
    payloads.len()
}

/// Alternates step runs and sequencer iterations until the job is terminal.
/// Returns the number of iterations it took.
pub async fn drive_to_completion(services: &TestServices, job_id: &str) -> usize {
    for iteration in 1..=64 {
        run_pending_steps(services).await;
        if !Sequencer::run_iteration(job_id, &services.config).await.unwrap() {
            return iteration;
        }
    }
    panic!("Job {} did not converge", job_id);
}
