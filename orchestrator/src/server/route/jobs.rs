use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{error, info, instrument};

use super::super::error::JobRouteError;
use super::super::types::{ApiResponse, JobId, JobRouteResult, JobStatusQuery, SubmitJobResponse};
use crate::core::config::Config;
use crate::types::jobs::job_item::SubmitJobRequest;
use crate::worker::service::JobService;

/// Accepts a job, stores its transactions and hands it to the sequencer.
///
/// # Errors
/// * `JobRouteError::InvalidRequest` - empty transaction list or missing identity fields
/// * `JobRouteError::ProcessingError` - the blob store, the store or the dispatcher failed
#[instrument(skip_all)]
async fn handle_submit_job_request(
    State(config): State<Arc<Config>>,
    Json(request): Json<SubmitJobRequest>,
) -> JobRouteResult {
    match JobService::submit_job(request, &config).await {
        Ok(job) => {
            info!(job_id = %job.id, "Job accepted");
            let body = SubmitJobResponse { job_id: job.id, tx_number: job.tx_number };
            Ok((StatusCode::CREATED, Json(ApiResponse::success_with_data(body, None))).into_response())
        }
        Err(e) => {
            error!(error = %e, "Failed to submit job");
            Err(JobRouteError::from(e))
        }
    }
}

/// Returns the job record. Reading a finished job marks it used.
#[instrument(skip_all, fields(job_id = %id))]
async fn handle_get_job_status_request(
    Path(JobId { id }): Path<JobId>,
    Query(query): Query<JobStatusQuery>,
    State(config): State<Arc<Config>>,
) -> JobRouteResult {
    let status = JobService::get_job_status(&query.owner_id, &id, query.logs, &config).await?;
    Ok(Json(ApiResponse::success_with_data(status, None)).into_response())
}

pub fn job_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", post(handle_submit_job_request))
        .route("/:id/status", get(handle_get_job_status_request))
        .with_state(config)
}
