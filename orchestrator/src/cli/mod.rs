use clap::{ArgGroup, Parser, Subcommand};

pub mod billing;
pub mod database;
pub mod provider;
pub mod queue;
pub mod sequencer;
pub mod server;
pub mod service;
pub mod storage;
pub mod worker;

#[derive(Parser, Debug)]
#[command(
    name = "proof-orchestrator",
    about = "Sequences tree-structured proof jobs across stateless workers",
    long_about = "Runs the job sequencer, the step runner consumers and the submission API.\n\n\
    Quick Start:\n  \
    proof-orchestrator run --memory-database --memory-storage --memory-queue \\\n    \
    --worker-registry-url http://localhost:8081"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator service
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[clap(
    group(
        ArgGroup::new("database")
            .args(&["mongodb", "memory_database"])
            .required(true)
            .multiple(false)
    ),
    group(
        ArgGroup::new("storage")
            .args(&["aws_s3", "memory_storage"])
            .required(true)
            .multiple(false)
    ),
    group(
        ArgGroup::new("queue")
            .args(&["aws_sqs", "memory_queue"])
            .required(true)
            .multiple(false)
    ),
)]
pub struct RunCmd {
    // Provider Config
    #[clap(flatten)]
    pub aws_config_args: provider::aws::AWSConfigCliArgs,

    // Database
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[arg(long)]
    pub memory_database: bool,

    // Storage
    #[clap(flatten)]
    pub aws_s3_args: storage::aws_s3::AWSS3CliArgs,

    #[arg(long)]
    pub memory_storage: bool,

    // Queue
    #[clap(flatten)]
    pub aws_sqs_args: queue::aws_sqs::AWSSQSCliArgs,

    #[arg(long)]
    pub memory_queue: bool,

    // Workers
    #[clap(flatten)]
    pub worker_args: worker::WorkerCliArgs,

    // Billing
    #[clap(flatten)]
    pub billing_args: billing::BillingCliArgs,

    // Sequencer
    #[clap(flatten)]
    pub sequencer_args: sequencer::SequencerCliArgs,

    // Service
    #[clap(flatten)]
    pub service_args: service::ServiceCliArgs,

    // Server
    #[clap(flatten)]
    pub server_args: server::ServerCliArgs,
}
