use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use dotenvy::dotenv;
use proof_orchestrator::cli::{Cli, Commands, RunCmd};
use proof_orchestrator::core::config::Config;
use proof_orchestrator::server::setup_server;
use proof_orchestrator::utils::logging::init_logging;
use proof_orchestrator::worker::initialize_worker;
use proof_orchestrator::OrchestratorResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Start the server
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    init_logging()?;
    info!("Starting proof orchestrator");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => {
            info!("Executing run command with args: {:?}", run_command);
            if let Err(e) = run_orchestrator(run_command).await {
                error!(error = %e, error_chain = ?e, "Orchestrator service failed");
                return Err(e.into());
            }
        }
    }
    Ok(())
}

async fn run_orchestrator(run_cmd: &RunCmd) -> OrchestratorResult<()> {
    let config = Arc::new(Config::setup(run_cmd).await?);
    debug!("Configuration initialized");

    let (address, server_handle) = setup_server(config.clone()).await?;
    info!(address = %address, "Application router initialized");

    let shutdown_token = CancellationToken::new();
    let worker_controller = initialize_worker(config.clone(), shutdown_token.clone());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for ctrl+c")?;
            info!("Received ctrl+c");
        }
        _ = shutdown_token.cancelled() => {
            error!("Queue consumers requested shutdown");
        }
    }

    worker_controller.shutdown().await?;
    server_handle.shutdown().await.context("Server task did not shut down cleanly")?;

    info!("Orchestrator service shutting down");
    Ok(())
}
