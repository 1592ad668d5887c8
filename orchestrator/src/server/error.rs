use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::job::JobError;
use crate::server::types::ApiResponse;

/// Errors surfaced by the job routes.
///
/// * `InvalidRequest` - 400 Bad Request
/// * `NotFound` - 404 Not Found
/// * `InvalidJobState` - 409 Conflict
/// * `ProcessingError` - 500 Internal Server Error
#[derive(Debug, thiserror::Error)]
pub enum JobRouteError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid job state: {0}")]
    InvalidJobState(String),

    #[error("Job processing error: {0}")]
    ProcessingError(String),
}

impl From<JobError> for JobRouteError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::ValidationError(msg) => JobRouteError::InvalidRequest(msg),
            JobError::JobNotFound { id } => JobRouteError::NotFound(id),
            e @ JobError::InvalidStatus { .. } => JobRouteError::InvalidJobState(e.to_string()),
            e => JobRouteError::ProcessingError(e.to_string()),
        }
    }
}

impl IntoResponse for JobRouteError {
    fn into_response(self) -> Response {
        let status = match &self {
            JobRouteError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            JobRouteError::NotFound(_) => StatusCode::NOT_FOUND,
            JobRouteError::InvalidJobState(_) => StatusCode::CONFLICT,
            JobRouteError::ProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
