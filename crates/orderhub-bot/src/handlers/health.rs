//! Health check handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use orderhub_core::config::BotMode;

use crate::state::BotState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mode: BotMode,
}

/// GET /health
pub async fn health(State(state): State<BotState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.config.bot.mode,
    })
}
