//! Connection ticket issuance and logout disconnect.

use axum::Json;
use axum::extract::State;

use orderhub_core::error::AppError;

use crate::dto::response::{ApiResponse, DisconnectResponse, TicketResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/realtime/ticket
pub async fn issue_ticket(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state.realtime.tickets.issue(auth.principal()).await?;
    Ok(Json(TicketResponse { ticket }))
}

/// POST /api/realtime/disconnect
///
/// Closes every connection of the caller.
pub async fn disconnect(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<ApiResponse<DisconnectResponse>> {
    let closed = state.realtime.connections.close_principal(auth.user_id);
    Json(ApiResponse::ok(DisconnectResponse { closed }))
}
