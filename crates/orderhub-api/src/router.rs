//! Route definitions for the OrderHub HTTP API.
//!
//! Public and admin routes are mounted under `/api`, the WebSocket endpoint
//! at `/ws`, and service-to-service routes under `/internal`.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with all routes, threading `AppState` through every handler.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(realtime_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .nest("/internal", internal_routes())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Ticket issuance and logout
fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route("/realtime/ticket", post(handlers::realtime::issue_ticket))
        .route("/realtime/disconnect", post(handlers::realtime::disconnect))
}

/// Notification queue inspection
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/queue/stats", get(handlers::admin::queue::stats))
        .route("/admin/queue/failed", get(handlers::admin::queue::list_failed))
        .route("/admin/queue/retry", post(handlers::admin::queue::retry))
        .route("/admin/queue/clean", post(handlers::admin::queue::clean))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Routes called by other OrderHub services with the shared secret
fn internal_routes() -> Router<AppState> {
    Router::new().route("/events", post(handlers::events::publish))
}
