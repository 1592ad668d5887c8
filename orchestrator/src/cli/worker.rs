use clap::Args;
use url::Url;

/// Parameters used to reach the proof workers.
#[derive(Debug, Clone, Args)]
pub struct WorkerCliArgs {
    /// Base URL of the worker registry, workers live at `{url}/{developer}/{repo}`.
    #[arg(env = "PROOF_ORCHESTRATOR_WORKER_REGISTRY_URL", long, required = true)]
    pub worker_registry_url: Url,

    /// Upper bound of one create or merge call.
    #[arg(env = "PROOF_ORCHESTRATOR_WORKER_TIMEOUT_SECONDS", long, default_value = "600")]
    pub worker_timeout_seconds: u64,
}
