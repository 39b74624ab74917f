//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;

/// Query for `GET /api/admin/queue/failed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FailedJobsQuery {
    /// Jobs to skip.
    #[serde(default)]
    pub offset: usize,
    /// Page size.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Body of `POST /api/admin/queue/retry`. Omitting `job_ids` retries every failed job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RetryJobsRequest {
    /// Jobs to retry.
    #[validate(length(min = 1, max = 1000))]
    #[serde(default)]
    pub job_ids: Option<Vec<Uuid>>,
}

/// Body of `POST /api/admin/queue/clean`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CleanJobsRequest {
    /// Remove completed jobs that finished at least this long ago.
    pub older_than_ms: u64,
}

/// Run `validator` and map failures to a validation error.
pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}
