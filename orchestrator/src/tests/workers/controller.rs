use std::time::Duration;

use rstest::*;
use tokio_util::sync::CancellationToken;

use crate::core::client::DatabaseClient;
use crate::tests::common::{build_submit_request, transaction};
use crate::tests::config::{fast_sequencer_params, TestConfigBuilder};
use crate::types::jobs::types::JobStatus;
use crate::types::params::SequencerParams;
use crate::worker::initialize_worker;
use crate::worker::service::JobService;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consumers_drive_submitted_job_to_completion() {
    let params = SequencerParams {
        max_run_time: Duration::from_secs(2),
        min_iteration_interval: Duration::from_millis(20),
        ..fast_sequencer_params()
    };
    let services = TestConfigBuilder::new().configure_sequencer_params(params).build().await;
    let shutdown = CancellationToken::new();
    let controller = initialize_worker(services.config.clone(), shutdown.clone());

    let job = JobService::submit_job(build_submit_request(4), &services.config).await.unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let stored = services.database.get_job(&job.id).await.unwrap().unwrap();
            if stored.status.is_terminal() {
                return stored;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("Job did not finish in time");

    assert_eq!(finished.status, JobStatus::Finished);
    assert_eq!(finished.result, Some((0..4).map(transaction).collect::<String>()));
    assert!(!shutdown.is_cancelled());

    controller.shutdown().await.unwrap();
}
