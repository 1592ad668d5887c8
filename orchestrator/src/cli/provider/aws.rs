use clap::Args;
use serde::Serialize;

/// Parameters used to config AWS.
#[derive(Debug, Clone, Args, Serialize)]
pub struct AWSConfigCliArgs {
    /// The prefix value.
    /// And added to the start of each resource name if available
    #[arg(env = "PROOF_ORCHESTRATOR_AWS_PREFIX", long, default_value = None)]
    pub aws_prefix: Option<String>,

    /// Region override, otherwise resolved from the standard AWS environment.
    #[arg(env = "AWS_REGION", long)]
    pub aws_region: Option<String>,

    /// Custom endpoint, e.g. a localstack instance.
    #[arg(env = "PROOF_ORCHESTRATOR_AWS_ENDPOINT_URL", long)]
    pub aws_endpoint_url: Option<String>,
}
