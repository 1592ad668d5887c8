use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use rstest::*;

use crate::core::client::DatabaseClient;
use crate::sequencer::health::{find_stuck_steps, MockStuckStepPolicy};
use crate::sequencer::Sequencer;
use crate::tests::common::{build_finished_step, build_job_item, transaction};
use crate::tests::config::{fast_sequencer_params, TestConfigBuilder};
use crate::types::params::SequencerParams;
use crate::types::steps::step_item::{StepHealthView, StepItem};
use crate::types::steps::types::StepStatus;

fn params() -> SequencerParams {
    SequencerParams {
        max_step_start_time: Duration::from_secs(60),
        max_step_run_time: Duration::from_secs(120),
        ..fast_sequencer_params()
    }
}

fn view(step_id: &str, status: StepStatus, created_ago_s: i64, started_ago_s: Option<i64>) -> StepHealthView {
    let now = Utc::now();
    let job = build_job_item(1);
    let mut step = StepItem::leaf(&job, 0, transaction(0));
    step.step_id = step_id.to_string();
    step.status = status;
    step.created_at = now - ChronoDuration::seconds(created_ago_s);
    step.started_at = started_ago_s.map(|s| now - ChronoDuration::seconds(s));
    StepHealthView::from(&step)
}

#[rstest]
fn stuck_steps_are_measured_against_their_own_budget() {
    let views = [
        view("waiting", StepStatus::Created, 90, None),
        view("fresh", StepStatus::Created, 10, None),
        view("slow", StepStatus::Started, 300, Some(150)),
        view("running", StepStatus::Started, 300, Some(90)),
        view("done", StepStatus::Finished, 3000, Some(3000)),
        view("fresh_claim", StepStatus::Used, 3000, Some(3000)),
    ];

    let stuck = find_stuck_steps(&views, &params(), Utc::now());

    let ids: Vec<_> = stuck.iter().map(|s| s.step_id.as_str()).collect();
    assert_eq!(ids, vec!["waiting", "slow"]);
    assert!(stuck[0].elapsed_ms >= 90_000);
    assert_eq!(stuck[1].status, StepStatus::Started);
}

#[rstest]
#[case::orphaned(90, true)]
#[case::in_flight(10, false)]
fn claims_are_measured_from_the_claim(#[case] claimed_ago_s: i64, #[case] stuck: bool) {
    let mut claimed = view("claimed", StepStatus::Used, 3000, Some(3000));
    claimed.updated_at = Utc::now() - ChronoDuration::seconds(claimed_ago_s);

    let found = find_stuck_steps(&[claimed], &params(), Utc::now());

    assert_eq!(found.len(), usize::from(stuck));
    if stuck {
        assert_eq!(found[0].status, StepStatus::Used);
        assert!(found[0].elapsed_ms >= claimed_ago_s * 1000);
    }
}

#[rstest]
#[tokio::test]
async fn orphaned_claim_is_reported() {
    let mut policy = MockStuckStepPolicy::new();
    policy
        .expect_on_unhealthy()
        .withf(|_, report| report.stuck.len() == 1 && report.stuck[0].status == StepStatus::Used)
        .times(1)
        .returning(|_, _| Ok(()));
    let services = TestConfigBuilder::new()
        .configure_sequencer_params(params())
        .mock_stuck_step_policy(Arc::new(policy))
        .build()
        .await;
    let job = build_job_item(2);
    let mut orphan = build_finished_step(&job, &[0]);
    orphan.status = StepStatus::Used;
    orphan.updated_at = Utc::now() - ChronoDuration::minutes(10);
    services.database.create_step(orphan).await.unwrap();
    services.database.create_step(build_finished_step(&job, &[1])).await.unwrap();

    let report = Sequencer::check_health(&job.id, &services.config).await.unwrap();

    assert_eq!(report.stuck.iter().map(|s| s.step_id.as_str()).collect::<Vec<_>>(), vec!["0"]);
}

#[rstest]
#[tokio::test]
async fn healthy_job_skips_the_policy() {
    let mut policy = MockStuckStepPolicy::new();
    policy.expect_on_unhealthy().times(0);
    let services = TestConfigBuilder::new()
        .configure_sequencer_params(params())
        .mock_stuck_step_policy(Arc::new(policy))
        .build()
        .await;
    let job = build_job_item(2);
    services.database.create_step(StepItem::leaf(&job, 0, transaction(0))).await.unwrap();
    services.database.create_step(build_finished_step(&job, &[1])).await.unwrap();

    let report = Sequencer::check_health(&job.id, &services.config).await.unwrap();

    assert!(report.is_healthy());
    assert_eq!(report.total_steps, 2);
}

#[rstest]
#[tokio::test]
async fn stuck_step_is_reported_without_touching_it() {
    let mut policy = MockStuckStepPolicy::new();
    policy
        .expect_on_unhealthy()
        .withf(|_, report| report.stuck.len() == 1 && report.stuck[0].step_id == "0")
        .times(1)
        .returning(|_, _| Ok(()));
    let services = TestConfigBuilder::new()
        .configure_sequencer_params(params())
        .mock_stuck_step_policy(Arc::new(policy))
        .build()
        .await;
    let job = build_job_item(1);
    let mut step = StepItem::leaf(&job, 0, transaction(0));
    step.created_at = Utc::now() - ChronoDuration::minutes(5);
    services.database.create_step(step.clone()).await.unwrap();

    let report = Sequencer::check_health(&job.id, &services.config).await.unwrap();

    assert!(!report.is_healthy());
    assert_eq!(services.database.get_step(&job.id, "0").await.unwrap().unwrap(), step);
}
