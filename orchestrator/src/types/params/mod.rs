pub mod sequencer;
pub mod service;

use std::time::Duration;

use crate::cli::RunCmd;
use crate::OrchestratorError;

pub use sequencer::SequencerParams;
pub use service::{ServerParams, ServiceParams, WorkerParams};

/// Runtime parameters that are not tied to a client implementation.
#[derive(Debug, Clone)]
pub struct OrchestratorParams {
    pub sequencer: SequencerParams,
    pub service: ServiceParams,
    pub server: ServerParams,
    /// Upper bound of one create or merge call
    pub worker_timeout: Duration,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            sequencer: SequencerParams::default(),
            service: ServiceParams::default(),
            server: ServerParams::default(),
            worker_timeout: Duration::from_secs(600),
        }
    }
}

impl From<&RunCmd> for OrchestratorParams {
    fn from(run_cmd: &RunCmd) -> Self {
        Self {
            sequencer: SequencerParams::from(run_cmd.sequencer_args.clone()),
            service: ServiceParams::from(run_cmd.service_args.clone()),
            server: ServerParams::from(run_cmd.server_args.clone()),
            worker_timeout: Duration::from_secs(run_cmd.worker_args.worker_timeout_seconds),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    pub connection_uri: String,
    pub database_name: String,
}

impl TryFrom<&RunCmd> for DatabaseArgs {
    type Error = OrchestratorError;
    fn try_from(run_cmd: &RunCmd) -> Result<Self, Self::Error> {
        Ok(Self {
            connection_uri: run_cmd
                .mongodb_args
                .mongodb_connection_url
                .clone()
                .ok_or_else(|| OrchestratorError::RunCommandError("Database Connection URL is required".to_string()))?,
            database_name: run_cmd
                .mongodb_args
                .mongodb_database_name
                .clone()
                .ok_or_else(|| OrchestratorError::RunCommandError("Database Name is required".to_string()))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StorageArgs {
    pub bucket_name: String,
}

impl StorageArgs {
    pub fn format_prefix_and_name(prefix: &str, name: &str) -> String {
        format!("{}-{}", prefix, name)
    }
}

impl TryFrom<&RunCmd> for StorageArgs {
    type Error = OrchestratorError;
    fn try_from(run_cmd: &RunCmd) -> Result<Self, Self::Error> {
        let bucket_name = run_cmd
            .aws_s3_args
            .bucket_name
            .clone()
            .ok_or_else(|| OrchestratorError::RunCommandError("Bucket name is required".to_string()))?;
        let bucket_name = match run_cmd.aws_config_args.aws_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => Self::format_prefix_and_name(prefix, &bucket_name),
            _ => bucket_name,
        };
        Ok(Self { bucket_name })
    }
}

#[derive(Debug, Clone)]
pub struct QueueArgs {
    /// Queue name with a `{}` placeholder for the queue type
    pub queue_template: String,
}

impl QueueArgs {
    pub fn format_prefix_and_name(prefix: &str, name: &str) -> String {
        format!("{}_{}", prefix, name)
    }
}

impl TryFrom<&RunCmd> for QueueArgs {
    type Error = OrchestratorError;
    fn try_from(run_cmd: &RunCmd) -> Result<Self, Self::Error> {
        let queue_template = run_cmd
            .aws_sqs_args
            .queue_template
            .clone()
            .ok_or_else(|| OrchestratorError::RunCommandError("Queue template is required".to_string()))?;
        if !queue_template.contains("{}") {
            return Err(OrchestratorError::RunCommandError(format!(
                "Queue template {} has no {{}} placeholder for the queue type",
                queue_template
            )));
        }
        let queue_template = match run_cmd.aws_config_args.aws_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => Self::format_prefix_and_name(prefix, &queue_template),
            _ => queue_template,
        };
        Ok(Self { queue_template })
    }
}
