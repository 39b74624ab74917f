//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use orderhub_core::traits::cache::CacheProvider;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = match state.cache.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            false
        }
    };
    let queue = match state.queue.stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "Queue stats unavailable");
            None
        }
    };

    Json(HealthResponse {
        status: if cache && queue.is_some() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache,
        connections: state.realtime.connections.connection_count(),
        online_users: state.realtime.connections.user_count(),
        queue,
    })
}
