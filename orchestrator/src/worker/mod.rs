pub mod controller;
pub mod parser;
pub mod service;
pub mod step_runner;
pub mod traits;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::core::config::Config;
use crate::worker::controller::worker_controller::WorkerController;

/// Starts the queue consumers in the background and returns their controller.
///
/// A consumer failing with an infrastructure error cancels `shutdown_token`,
/// which brings the whole service down.
pub fn initialize_worker(config: Arc<Config>, shutdown_token: CancellationToken) -> WorkerController {
    let controller = WorkerController::new(config, shutdown_token.child_token());

    let running = controller.clone();
    tokio::spawn(async move {
        if let Err(e) = running.run().await {
            error!(error = %e, "Queue consumers stopped, shutting down");
            shutdown_token.cancel();
        }
    });

    info!("Queue consumers started");
    controller
}
