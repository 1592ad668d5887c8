use bytes::Bytes;
use rstest::*;

use crate::core::client::{DatabaseClient, StorageClient};
use crate::sequencer::Sequencer;
use crate::tests::common::{build_submit_request, run_pending_starts, transaction};
use crate::tests::config::TestConfigBuilder;
use crate::types::jobs::types::JobStatus;
use crate::types::queue::{QueueType, SequencerQueueMessage, StepQueueMessage};
use crate::types::steps::step_item::StepItem;
use crate::types::steps::types::{StepStatus, StepTask};
use crate::worker::service::JobService;

#[rstest]
#[tokio::test]
async fn start_job_creates_one_leaf_per_transaction() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(4), &services.config).await.unwrap();

    run_pending_starts(&services).await;

    let steps = services.database.steps_of(&job.id).unwrap();
    assert_eq!(steps.len(), 4);
    for step in &steps {
        let index: usize = step.step_id.parse().unwrap();
        assert_eq!(step.task, StepTask::Create);
        assert_eq!(step.status, StepStatus::Created);
        assert_eq!(step.origins, vec![step.step_id.clone()]);
        assert_eq!(step.step_data, vec![transaction(index)]);
        assert_eq!(step.chain, "devnet");
    }

    let dispatched = services.queue.drain(QueueType::StepRun).await.unwrap();
    let mut dispatched_ids: Vec<String> = dispatched
        .iter()
        .map(|payload| serde_json::from_str::<StepQueueMessage>(payload).unwrap().step_id)
        .collect();
    dispatched_ids.sort();
    assert_eq!(dispatched_ids, vec!["0", "1", "2", "3"]);

    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Started);
    assert!(stored.started_at.is_some());

    // No run budget in tests, so the loop hands the job straight over
    let handed_over = services.queue.drain(QueueType::SequencerRun).await.unwrap();
    assert_eq!(handed_over.len(), 1);
    let message: SequencerQueueMessage = serde_json::from_str(&handed_over[0]).unwrap();
    assert_eq!(message.job_id, job.id);
}

#[rstest]
#[tokio::test]
async fn start_job_tolerates_leaves_from_an_earlier_attempt() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(3), &services.config).await.unwrap();
    services.database.create_step(StepItem::leaf(&job, 0, transaction(0))).await.unwrap();

    Sequencer::start_job(&job.id, services.config.clone()).await.unwrap();

    assert_eq!(services.database.steps_of(&job.id).unwrap().len(), 3);
    assert_eq!(services.queue.drain(QueueType::StepRun).await.unwrap().len(), 3);
    assert_eq!(services.database.get_job(&job.id).await.unwrap().unwrap().status, JobStatus::Started);
}

#[rstest]
#[tokio::test]
async fn start_job_fails_job_with_missing_input() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(2), &services.config).await.unwrap();
    services.storage.delete_data(job.filename.as_deref().unwrap()).await.unwrap();

    Sequencer::start_job(&job.id, services.config.clone()).await.unwrap();

    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.failed_at.is_some());
    assert!(stored.result.unwrap().contains("missing"));
    assert!(services.database.steps_of(&job.id).unwrap().is_empty());
    assert!(services.queue.drain(QueueType::StepRun).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn start_job_fails_job_when_input_disagrees_with_tx_number() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(3), &services.config).await.unwrap();
    let blob = serde_json::to_vec(&serde_json::json!({ "transactions": ["only-one"] })).unwrap();
    services.storage.put_data(Bytes::from(blob), job.filename.as_deref().unwrap()).await.unwrap();

    Sequencer::start_job(&job.id, services.config.clone()).await.unwrap();

    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(services.database.steps_of(&job.id).unwrap().is_empty());
}

#[rstest]
#[case::finished(JobStatus::Finished)]
#[case::failed(JobStatus::Failed)]
#[tokio::test]
async fn start_job_ignores_terminal_jobs(#[case] status: JobStatus) {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(2), &services.config).await.unwrap();
    services.database.update_job_status_if(&job.id, JobStatus::Created, status, chrono::Utc::now()).await.unwrap();

    Sequencer::start_job(&job.id, services.config.clone()).await.unwrap();

    assert!(services.database.steps_of(&job.id).unwrap().is_empty());
    assert!(services.queue.drain(QueueType::SequencerRun).await.unwrap().is_empty());
}
