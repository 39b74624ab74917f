//! Response DTOs.

use serde::{Deserialize, Serialize};

use orderhub_worker::QueueStats;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Connection ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    /// Single-use ticket for `GET /ws?ticket=`.
    pub ticket: String,
}

/// Result of a logout disconnect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectResponse {
    /// Connections closed.
    pub closed: usize,
}

/// Result of a retry request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryJobsResponse {
    /// Jobs moved back to pending.
    pub retried: u64,
}

/// Result of a clean request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanJobsResponse {
    /// Completed jobs removed.
    pub removed: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the cache or queue store is unreachable.
    pub status: String,
    /// Build version.
    pub version: String,
    /// Whether the cache backend answered.
    pub cache: bool,
    /// Open WebSocket connections.
    pub connections: usize,
    /// Distinct connected principals.
    pub online_users: usize,
    /// Queue statistics.
    pub queue: Option<QueueStats>,
}
