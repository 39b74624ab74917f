//! Internal order event ingress.

use axum::Json;
use axum::extract::State;

use orderhub_realtime::{OrderEvent, PublishOutcome};

use crate::dto::response::ApiResponse;
use crate::extractors::InternalCaller;
use crate::state::AppState;

/// POST /internal/events
pub async fn publish(
    State(state): State<AppState>,
    _caller: InternalCaller,
    Json(event): Json<OrderEvent>,
) -> Json<ApiResponse<PublishOutcome>> {
    let outcome = state.realtime.events.publish(event).await;
    Json(ApiResponse::ok(outcome))
}
