use axum::response::Response;
use serde::{Deserialize, Serialize};

use super::error::JobRouteError;

/// Job identifier taken from the request path.
#[derive(Deserialize)]
pub struct JobId {
    pub id: String,
}

/// Query string of the status route. The caller must name the owner the job
/// was submitted for, a job of another owner reads as not found.
#[derive(Deserialize, Debug)]
pub struct JobStatusQuery {
    pub owner_id: String,
    /// Attach the step log excerpts
    #[serde(default)]
    pub logs: bool,
}

/// Body of a successful submission.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubmitJobResponse {
    pub job_id: String,
    pub tx_number: u64,
}

/// Uniform envelope of every API response.
///
/// ```
/// use proof_orchestrator::server::types::ApiResponse;
/// let response = ApiResponse::error("Invalid job ID".to_string());
/// assert!(!response.success);
/// assert_eq!(response.message, Some("Invalid job ID".to_string()));
/// ```
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Typically used for error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse<()> {
    pub fn error(message: String) -> Self {
        Self { success: false, data: None, message: Some(message) }
    }
}

impl<T> ApiResponse<T> {
    pub fn success_with_data(data: T, message: Option<String>) -> Self {
        Self { success: true, data: Some(data), message }
    }

    pub fn success(message: Option<String>) -> Self {
        Self { success: true, data: None, message }
    }
}

pub type JobRouteResult = Result<Response<axum::body::Body>, JobRouteError>;
