use assert_matches::assert_matches;
use bytes::Bytes;
use rstest::*;

use crate::core::client::{DatabaseClient, StorageClient};
use crate::error::job::JobError;
use crate::tests::common::{build_submit_request, submit_request};
use crate::tests::config::TestConfigBuilder;
use crate::types::jobs::job_item::SubmitJobRequest;
use crate::types::jobs::types::JobStatus;
use crate::types::queue::{QueueType, SequencerQueueMessage};
use crate::types::TransactionsBlob;
use crate::worker::service::JobService;

#[rstest]
#[tokio::test]
async fn submit_stores_input_and_triggers_sequencer(submit_request: SubmitJobRequest) {
    let services = TestConfigBuilder::new().build().await;

    let job = JobService::submit_job(submit_request.clone(), &services.config).await.unwrap();

    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(job.tx_number, 3);
    assert_eq!(job.owner_id, submit_request.owner_id);
    assert_eq!(services.database.get_job(&job.id).await.unwrap(), Some(job.clone()));

    let blob = services.storage.get_data(job.filename.as_deref().unwrap()).await.unwrap();
    let blob: TransactionsBlob = serde_json::from_slice(&blob).unwrap();
    assert_eq!(blob.transactions, submit_request.transactions);

    let triggers = services.queue.drain(QueueType::SequencerStart).await.unwrap();
    assert_eq!(triggers.len(), 1);
    assert_eq!(serde_json::from_str::<SequencerQueueMessage>(&triggers[0]).unwrap().job_id, job.id);
}

#[rstest]
#[case::no_transactions(|r: &mut SubmitJobRequest| r.transactions.clear())]
#[case::blank_owner(|r: &mut SubmitJobRequest| r.owner_id = " ".to_string())]
#[case::blank_repo(|r: &mut SubmitJobRequest| r.repo = String::new())]
#[tokio::test]
async fn submit_rejects_invalid_requests(#[case] tamper: fn(&mut SubmitJobRequest)) {
    let services = TestConfigBuilder::new().build().await;
    let mut request = build_submit_request(2);
    tamper(&mut request);

    assert_matches!(JobService::submit_job(request, &services.config).await, Err(JobError::ValidationError(_)));
    assert!(services.queue.drain(QueueType::SequencerStart).await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn reading_finished_job_marks_it_used_once() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(1), &services.config).await.unwrap();
    services.database.update_job_status_if(&job.id, JobStatus::Created, JobStatus::Finished, chrono::Utc::now()).await.unwrap();

    let first = JobService::get_job_status("owner-1", &job.id, false, &services.config).await.unwrap();
    assert_eq!(first.job.status, JobStatus::Finished);
    assert!(first.logs.is_none());

    let second = JobService::get_job_status("owner-1", &job.id, false, &services.config).await.unwrap();
    assert_eq!(second.job.status, JobStatus::Used);
    assert!(second.job.used_at.is_some());
}

#[rstest]
#[tokio::test]
async fn status_of_another_owner_is_not_found() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(1), &services.config).await.unwrap();

    assert_matches!(
        JobService::get_job_status("intruder", &job.id, false, &services.config).await,
        Err(JobError::JobNotFound { .. })
    );
    assert_matches!(
        JobService::get_job_status("owner-1", "missing", false, &services.config).await,
        Err(JobError::JobNotFound { .. })
    );
}

#[rstest]
#[tokio::test]
async fn status_attaches_readable_log_excerpts() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(1), &services.config).await.unwrap();
    services.storage.put_data(Bytes::from_static(b"attempt 1 ok"), "logs/a.log").await.unwrap();
    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    let updates = crate::types::jobs::job_updates::JobItemUpdates::new()
        .update_logs(vec!["logs/a.log".to_string(), "logs/gone.log".to_string()])
        .build()
        .unwrap();
    services.database.update_job(&stored, updates).await.unwrap();

    let status = JobService::get_job_status("owner-1", &job.id, true, &services.config).await.unwrap();

    assert_eq!(status.logs, Some(vec!["attempt 1 ok".to_string()]));
}

#[rstest]
#[tokio::test]
async fn fail_job_keeps_first_reason_and_skips_terminal_jobs() {
    let services = TestConfigBuilder::new().build().await;
    let job = JobService::submit_job(build_submit_request(1), &services.config).await.unwrap();

    JobService::fail_job(&job.id, "first", &services.config).await.unwrap();
    JobService::fail_job(&job.id, "second", &services.config).await.unwrap();

    let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.result, Some("first".to_string()));
    assert_matches!(
        JobService::fail_job("missing", "reason", &services.config).await,
        Err(JobError::JobNotFound { .. })
    );
}
