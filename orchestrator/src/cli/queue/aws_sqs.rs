use clap::Args;

/// Parameters used to config AWS SQS.
#[derive(Debug, Clone, Args)]
pub struct AWSSQSCliArgs {
    /// Use the AWS SQS client
    #[arg(long)]
    pub aws_sqs: bool,

    /// Queue name template, `{}` is replaced by the queue type.
    #[arg(env = "PROOF_ORCHESTRATOR_AWS_SQS_QUEUE_TEMPLATE", long, default_value = Some("proof_orchestrator_{}_queue"))]
    pub queue_template: Option<String>,
}
