//! Route definitions for the bot-service.
//!
//! `/internal` routes require the shared secret; `/webhook/telegram` is
//! gated by Telegram's secret token header when one is configured.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::BotState;

/// Build the router with all routes.
pub fn build_router(state: BotState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/telegram", post(handlers::webhook::telegram_webhook))
        .nest("/internal", internal_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes called by the backend
fn internal_routes() -> Router<BotState> {
    Router::new()
        .route(
            "/telegram/notification",
            post(handlers::internal::send_notification),
        )
        .route("/telegram/broadcast", post(handlers::internal::send_broadcast))
        .route(
            "/telegram/start-message",
            post(handlers::internal::send_start_message),
        )
        .route(
            "/telegram/answer-callback",
            post(handlers::internal::answer_callback),
        )
        .route(
            "/campaigns/{id}/status",
            post(handlers::internal::update_campaign_status),
        )
}
