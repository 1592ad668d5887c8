use std::sync::Arc;
use std::time::Duration;

use rstest::*;

use crate::core::client::worker::{MockProofWorker, MockWorkerRegistry, ProofWorker, WorkerError};
use crate::core::client::{DatabaseClient, StorageClient};
use crate::tests::common::{build_finished_step, build_job_item, transaction};
use crate::tests::config::{TestConfigBuilder, TestServices};
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::types::JobStatus;
use crate::types::steps::step_item::StepItem;
use crate::types::steps::types::StepStatus;
use crate::worker::step_runner::StepRunner;

async fn seed_leaf(services: &TestServices) -> (JobItem, StepItem) {
    let job = build_job_item(2);
    services.database.create_job(job.clone()).await.unwrap();
    let step = StepItem::leaf(&job, 0, transaction(0));
    services.database.create_step(step.clone()).await.unwrap();
    (job, step)
}

/// Registry whose only worker answers `create` with `outcome`.
fn registry_returning(
    outcome: fn() -> Result<Option<String>, WorkerError>,
    expected_restarts: usize,
) -> MockWorkerRegistry {
    let mut registry = MockWorkerRegistry::new();
    registry.expect_get_worker().times(1).returning(move |_| {
        let mut worker = MockProofWorker::new();
        worker.expect_create().times(1).returning(move |_| outcome());
        Ok(Arc::new(worker) as Arc<dyn ProofWorker>)
    });
    registry.expect_restart().times(expected_restarts).returning(|_, _| Ok(()));
    registry
}

#[rstest]
#[tokio::test]
async fn successful_step_stores_proof_and_marker() {
    let services = TestConfigBuilder::new().build().await;
    let (job, step) = seed_leaf(&services).await;

    StepRunner::run_step(&job.id, &step.step_id, services.config.clone()).await.unwrap();

    let finished = services.database.get_step(&job.id, "0").await.unwrap().unwrap();
    assert_eq!(finished.status, StepStatus::Finished);
    assert_eq!(finished.result, Some(transaction(0)));
    assert_eq!(finished.attempts, 1);
    assert!(finished.compute_time_ms().is_some());

    let log_key = StepRunner::log_key(&job.id, "0", 1);
    assert_eq!(finished.logs, vec![log_key.clone()]);
    let excerpt = services.storage.get_data(&log_key).await.unwrap();
    assert!(String::from_utf8_lossy(&excerpt).contains("proof produced"));

    let markers = services.database.get_proof_markers(&job.id).await.unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].step_id, "0");
}

#[rstest]
#[tokio::test]
async fn empty_proof_fails_step_and_job_without_restart() {
    let registry = registry_returning(|| Ok(None), 0);
    let services = TestConfigBuilder::new().mock_workers(Arc::new(registry)).build().await;
    let (job, step) = seed_leaf(&services).await;

    StepRunner::run_step(&job.id, &step.step_id, services.config.clone()).await.unwrap();

    let failed = services.database.get_step(&job.id, "0").await.unwrap().unwrap();
    assert_eq!(failed.status, StepStatus::Failed);
    assert!(failed.failed_at.is_some());
    let stored_job = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Failed);
    assert!(stored_job.result.unwrap().contains("no proof"));
    assert!(services.database.get_proof_markers(&job.id).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn worker_error_fails_step_and_restarts_worker() {
    let registry =
        registry_returning(|| Err(WorkerError::WorkerService(reqwest::StatusCode::BAD_GATEWAY)), 1);
    let services = TestConfigBuilder::new().mock_workers(Arc::new(registry)).build().await;
    let (job, step) = seed_leaf(&services).await;

    StepRunner::run_step(&job.id, &step.step_id, services.config.clone()).await.unwrap();

    let failed = services.database.get_step(&job.id, "0").await.unwrap().unwrap();
    assert_eq!(failed.status, StepStatus::Failed);
    assert_eq!(failed.logs.len(), 1);
    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Failed);
}

#[rstest]
#[tokio::test]
async fn slow_worker_times_out() {
    let mut registry = MockWorkerRegistry::new();
    registry.expect_get_worker().returning(|_| Ok(Arc::new(SlowWorker) as Arc<dyn ProofWorker>));
    registry.expect_restart().times(1).returning(|_, _| Ok(()));
    let services = TestConfigBuilder::new()
        .mock_workers(Arc::new(registry))
        .configure_worker_timeout(Duration::from_millis(20))
        .build()
        .await;
    let (job, step) = seed_leaf(&services).await;

    StepRunner::run_step(&job.id, &step.step_id, services.config.clone()).await.unwrap();

    let stored_job = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Failed);
    assert!(stored_job.result.unwrap().contains("timed out"));
}

struct SlowWorker;

#[async_trait::async_trait]
impl ProofWorker for SlowWorker {
    async fn create(&self, _input: &str) -> Result<Option<String>, WorkerError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Some("late".to_string()))
    }

    async fn merge(&self, _left: &str, _right: &str) -> Result<Option<String>, WorkerError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Some("late".to_string()))
    }
}

#[rstest]
#[tokio::test]
async fn exhausted_step_is_rejected_without_calling_worker() {
    let mut registry = MockWorkerRegistry::new();
    registry.expect_get_worker().times(0);
    registry.expect_restart().times(0);
    let services = TestConfigBuilder::new().mock_workers(Arc::new(registry)).build().await;
    let job = build_job_item(1);
    services.database.create_job(job.clone()).await.unwrap();
    let mut step = StepItem::leaf(&job, 0, transaction(0));
    step.status = StepStatus::Started;
    step.attempts = services.config.sequencer_params().max_step_attempts;
    services.database.create_step(step).await.unwrap();

    StepRunner::run_step(&job.id, "0", services.config.clone()).await.unwrap();

    assert_eq!(services.database.get_step(&job.id, "0").await.unwrap().unwrap().status, StepStatus::Failed);
    let stored_job = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored_job.status, JobStatus::Failed);
    assert!(stored_job.result.unwrap().contains("exhausted"));
}

#[rstest]
#[tokio::test]
async fn last_allowed_attempt_still_runs() {
    let services = TestConfigBuilder::new().build().await;
    let job = build_job_item(1);
    services.database.create_job(job.clone()).await.unwrap();
    let max_attempts = services.config.sequencer_params().max_step_attempts;
    let mut step = StepItem::leaf(&job, 0, transaction(0));
    step.status = StepStatus::Started;
    step.attempts = max_attempts - 1;
    services.database.create_step(step).await.unwrap();

    StepRunner::run_step(&job.id, "0", services.config.clone()).await.unwrap();

    let finished = services.database.get_step(&job.id, "0").await.unwrap().unwrap();
    assert_eq!(finished.status, StepStatus::Finished);
    assert_eq!(finished.attempts, max_attempts);
}

#[rstest]
#[tokio::test]
async fn merge_step_with_one_input_is_rejected() {
    let mut registry = MockWorkerRegistry::new();
    registry.expect_get_worker().times(0);
    registry.expect_restart().times(0);
    let services = TestConfigBuilder::new().mock_workers(Arc::new(registry)).build().await;
    let job = build_job_item(2);
    services.database.create_job(job.clone()).await.unwrap();
    let mut merge = StepItem::merge(&build_finished_step(&job, &[0]), &build_finished_step(&job, &[1]));
    merge.step_data.pop();
    services.database.create_step(merge.clone()).await.unwrap();

    StepRunner::run_step(&job.id, &merge.step_id, services.config.clone()).await.unwrap();

    let failed = services.database.get_step(&job.id, &merge.step_id).await.unwrap().unwrap();
    assert_eq!(failed.status, StepStatus::Failed);
    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Failed);
}

#[rstest]
#[case::finished(StepStatus::Finished)]
#[case::failed(StepStatus::Failed)]
#[case::used(StepStatus::Used)]
#[tokio::test]
async fn redelivered_step_is_skipped(#[case] status: StepStatus) {
    let mut registry = MockWorkerRegistry::new();
    registry.expect_get_worker().times(0);
    let services = TestConfigBuilder::new().mock_workers(Arc::new(registry)).build().await;
    let job = build_job_item(1);
    services.database.create_job(job.clone()).await.unwrap();
    let mut step = build_finished_step(&job, &[0]);
    step.status = status;
    services.database.create_step(step.clone()).await.unwrap();

    StepRunner::run_step(&job.id, &step.step_id, services.config.clone()).await.unwrap();

    assert_eq!(services.database.get_step(&job.id, &step.step_id).await.unwrap().unwrap(), step);
}

#[rstest]
#[tokio::test]
async fn missing_step_is_skipped() {
    let services = TestConfigBuilder::new().build().await;
    let job = build_job_item(1);
    services.database.create_job(job.clone()).await.unwrap();

    StepRunner::run_step(&job.id, "7", services.config.clone()).await.unwrap();

    assert!(services.database.steps_of(&job.id).unwrap().is_empty());
}
