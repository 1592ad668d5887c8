use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rstest::*;

use crate::core::client::billing::{BillingError, MockBillingClient};
use crate::core::client::DatabaseClient;
use crate::sequencer::Sequencer;
use crate::tests::common::{build_finished_step, build_job_item};
use crate::tests::config::{fast_sequencer_params, TestConfigBuilder};
use crate::types::jobs::types::JobStatus;
use crate::types::params::SequencerParams;
use crate::types::proof_marker::ProofMarker;
use crate::types::queue::QueueType;
use crate::types::steps::types::StepStatus;

fn looping_params() -> SequencerParams {
    SequencerParams {
        max_run_time: Duration::from_secs(5),
        min_iteration_interval: Duration::from_millis(1),
        ..fast_sequencer_params()
    }
}

#[rstest]
#[tokio::test]
async fn run_finishes_ready_job_without_handing_over() {
    let services = TestConfigBuilder::new().configure_sequencer_params(looping_params()).build().await;
    let job = build_job_item(2);
    services.database.create_job(job.clone()).await.unwrap();
    let step = build_finished_step(&job, &[0, 1]);
    services.database.create_step(step.clone()).await.unwrap();
    services.database.create_proof_marker(ProofMarker::new(&job.id, &step.step_id)).await.unwrap();

    Sequencer::run(&job.id, services.config.clone()).await.unwrap();

    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Finished);
    assert!(services.queue.drain(QueueType::SequencerRun).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn run_fails_expired_job_when_budget_runs_out() {
    let params = SequencerParams {
        max_run_time: Duration::from_millis(20),
        min_iteration_interval: Duration::from_millis(5),
        ..fast_sequencer_params()
    };
    let services = TestConfigBuilder::new().configure_sequencer_params(params).build().await;
    let mut job = build_job_item(2);
    job.created_at = Utc::now() - ChronoDuration::hours(1);
    services.database.create_job(job.clone()).await.unwrap();

    Sequencer::run(&job.id, services.config.clone()).await.unwrap();

    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Failed);
    assert!(services.queue.drain(QueueType::SequencerRun).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn run_hands_over_unfinished_job() {
    let params = SequencerParams {
        max_run_time: Duration::from_millis(20),
        min_iteration_interval: Duration::from_millis(5),
        ..fast_sequencer_params()
    };
    let services = TestConfigBuilder::new().configure_sequencer_params(params).build().await;
    let job = build_job_item(2);
    services.database.create_job(job.clone()).await.unwrap();

    Sequencer::run(&job.id, services.config.clone()).await.unwrap();

    assert_eq!(services.queue.drain(QueueType::SequencerRun).await.unwrap().len(), 1);
    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Created);
}

#[rstest]
#[tokio::test]
async fn run_fails_job_after_retries_are_exhausted() {
    let mut billing = MockBillingClient::new();
    // First attempt plus two retries
    billing
        .expect_charge()
        .times(3)
        .returning(|_| Err(BillingError::BillingService(reqwest::StatusCode::INTERNAL_SERVER_ERROR)));
    let services = TestConfigBuilder::new()
        .configure_sequencer_params(looping_params())
        .mock_billing(Arc::new(billing))
        .build()
        .await;
    let job = build_job_item(1);
    services.database.create_job(job.clone()).await.unwrap();
    let step = build_finished_step(&job, &[0]);
    services.database.create_step(step.clone()).await.unwrap();
    services.database.create_proof_marker(ProofMarker::new(&job.id, &step.step_id)).await.unwrap();

    Sequencer::run(&job.id, services.config.clone()).await.unwrap();

    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.result.unwrap().contains("Sequencer iteration failed"));
    assert_eq!(services.database.get_step(&job.id, "0").await.unwrap().unwrap().status, StepStatus::Finished);
}
