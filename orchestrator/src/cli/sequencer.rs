use clap::Args;

/// Timing budgets of the sequencer loop and the step runner.
#[derive(Debug, Clone, Args)]
pub struct SequencerCliArgs {
    /// Wall-clock budget of one sequencer run before it re-dispatches itself.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_RUN_TIME_SECONDS", long, default_value = "600")]
    pub max_run_time_seconds: u64,

    /// Minimum spacing between two reduction iterations.
    #[arg(env = "PROOF_ORCHESTRATOR_MIN_ITERATION_INTERVAL_MS", long, default_value = "10000")]
    pub min_iteration_interval_ms: u64,

    /// Jobs older than this are failed instead of continued.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_JOB_TIME_SECONDS", long, default_value = "1800")]
    pub max_job_time_seconds: u64,

    /// A created step not started within this window is reported as stuck.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_STEP_START_TIME_SECONDS", long, default_value = "300")]
    pub max_step_start_time_seconds: u64,

    /// A started step not finished within this window is reported as stuck.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_STEP_RUN_TIME_SECONDS", long, default_value = "600")]
    pub max_step_run_time_seconds: u64,

    /// Attempts after which a step is rejected.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_STEP_ATTEMPTS", long, default_value = "5")]
    pub max_step_attempts: u32,

    /// Run the health check every this many iterations.
    #[arg(env = "PROOF_ORCHESTRATOR_HEALTH_CHECK_EVERY", long, default_value = "4")]
    pub health_check_every: u64,

    /// Consecutive retryable iteration failures tolerated before the job fails.
    #[arg(env = "PROOF_ORCHESTRATOR_MAX_ITERATION_RETRIES", long, default_value = "3")]
    pub max_iteration_retries: u32,

    /// Base delay of the exponential backoff between iteration retries.
    #[arg(env = "PROOF_ORCHESTRATOR_ITERATION_RETRY_BACKOFF_MS", long, default_value = "1000")]
    pub iteration_retry_backoff_ms: u64,
}
