use std::time::Duration;

use url::Url;

use crate::cli::server::ServerCliArgs;
use crate::cli::service::ServiceCliArgs;
use crate::cli::worker::WorkerCliArgs;

#[derive(Debug, Clone)]
pub struct ServiceParams {
    pub max_concurrent_steps: usize,
    pub max_concurrent_sequencers: usize,
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self { max_concurrent_steps: 16, max_concurrent_sequencers: 8 }
    }
}

impl From<ServiceCliArgs> for ServiceParams {
    fn from(args: ServiceCliArgs) -> Self {
        Self { max_concurrent_steps: args.max_concurrent_steps, max_concurrent_sequencers: args.max_concurrent_sequencers }
    }
}

#[derive(Debug, Clone)]
pub struct ServerParams {
    pub host: String,
    pub port: u16,
}

impl Default for ServerParams {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 0 }
    }
}

impl From<ServerCliArgs> for ServerParams {
    fn from(args: ServerCliArgs) -> Self {
        Self { host: args.host, port: args.port }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerParams {
    pub registry_url: Url,
    pub call_timeout: Duration,
}

impl From<WorkerCliArgs> for WorkerParams {
    fn from(args: WorkerCliArgs) -> Self {
        Self { registry_url: args.worker_registry_url, call_timeout: Duration::from_secs(args.worker_timeout_seconds) }
    }
}
