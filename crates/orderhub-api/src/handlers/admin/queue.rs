//! Notification queue inspection and maintenance.

use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};

use orderhub_core::error::AppError;
use orderhub_entity::job::NotificationJob;
use orderhub_worker::QueueStats;

use crate::dto::request::{CleanJobsRequest, FailedJobsQuery, RetryJobsRequest, validate_request};
use crate::dto::response::{ApiResponse, CleanJobsResponse, RetryJobsResponse};
use crate::extractors::AuthUser;
use crate::middleware::rbac::require_admin;
use crate::state::AppState;

/// GET /api/admin/queue/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<QueueStats>>, AppError> {
    require_admin(&auth)?;
    let stats = state.queue.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/admin/queue/failed?offset&limit
pub async fn list_failed(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FailedJobsQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationJob>>>, AppError> {
    require_admin(&auth)?;
    validate_request(&query)?;

    let jobs = state.queue.list_failed(query.offset, query.limit).await?;
    Ok(Json(ApiResponse::ok(jobs)))
}

/// POST /api/admin/queue/retry
pub async fn retry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RetryJobsRequest>,
) -> Result<Json<ApiResponse<RetryJobsResponse>>, AppError> {
    require_admin(&auth)?;
    validate_request(&req)?;

    let retried = state.queue.retry_failed(req.job_ids.as_deref()).await?;
    tracing::info!(user_id = auth.user_id, retried, "Failed jobs retried by admin");
    Ok(Json(ApiResponse::ok(RetryJobsResponse { retried })))
}

/// POST /api/admin/queue/clean
pub async fn clean(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CleanJobsRequest>,
) -> Result<Json<ApiResponse<CleanJobsResponse>>, AppError> {
    require_admin(&auth)?;

    let removed = state
        .queue
        .clean(Duration::from_millis(req.older_than_ms))
        .await?;
    Ok(Json(ApiResponse::ok(CleanJobsResponse { removed })))
}
