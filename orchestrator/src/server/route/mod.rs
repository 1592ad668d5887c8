use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::core::config::Config;
use crate::server::types::ApiResponse;
use jobs::job_router;

pub(super) mod jobs;

/// Fallback for every unknown path.
pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("The requested resource was not found".to_string())))
}

async fn handle_health() -> impl IntoResponse {
    Json(ApiResponse::<()>::success(Some("ok".to_string())))
}

pub(crate) fn server_router(config: Arc<Config>) -> Router {
    Router::new().route("/health", get(handle_health)).nest("/jobs", job_router(config)).fallback(handler_404)
}
