use std::time::Duration;

use crate::cli::sequencer::SequencerCliArgs;

/// Timing budgets shared by the sequencer and the step runner.
#[derive(Debug, Clone)]
pub struct SequencerParams {
    pub max_run_time: Duration,
    pub min_iteration_interval: Duration,
    pub max_job_time: Duration,
    pub max_step_start_time: Duration,
    pub max_step_run_time: Duration,
    pub max_step_attempts: u32,
    pub health_check_every: u64,
    pub max_iteration_retries: u32,
    pub iteration_retry_backoff: Duration,
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            max_run_time: Duration::from_secs(600),
            min_iteration_interval: Duration::from_secs(10),
            max_job_time: Duration::from_secs(1800),
            max_step_start_time: Duration::from_secs(300),
            max_step_run_time: Duration::from_secs(600),
            max_step_attempts: 5,
            health_check_every: 4,
            max_iteration_retries: 3,
            iteration_retry_backoff: Duration::from_secs(1),
        }
    }
}

impl From<SequencerCliArgs> for SequencerParams {
    fn from(args: SequencerCliArgs) -> Self {
        Self {
            max_run_time: Duration::from_secs(args.max_run_time_seconds),
            min_iteration_interval: Duration::from_millis(args.min_iteration_interval_ms),
            max_job_time: Duration::from_secs(args.max_job_time_seconds),
            max_step_start_time: Duration::from_secs(args.max_step_start_time_seconds),
            max_step_run_time: Duration::from_secs(args.max_step_run_time_seconds),
            max_step_attempts: args.max_step_attempts,
            health_check_every: args.health_check_every.max(1),
            max_iteration_retries: args.max_iteration_retries,
            iteration_retry_backoff: Duration::from_millis(args.iteration_retry_backoff_ms),
        }
    }
}
