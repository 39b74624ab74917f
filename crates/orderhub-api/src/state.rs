//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use orderhub_cache::CacheManager;
use orderhub_core::config::AppConfig;
use orderhub_realtime::RealtimeEngine;
use orderhub_worker::JobQueue;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Cache manager (Redis or in-memory); holds admin sessions and tickets
    pub cache: CacheManager,
    /// Real-time engine
    pub realtime: RealtimeEngine,
    /// Notification job queue
    pub queue: Arc<JobQueue>,
}

impl AppState {
    /// Assemble the state.
    pub fn new(
        config: Arc<AppConfig>,
        cache: CacheManager,
        realtime: RealtimeEngine,
        queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            config,
            cache,
            realtime,
            queue,
        }
    }
}
