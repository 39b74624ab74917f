//! WebSocket upgrade handler.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use orderhub_core::error::AppError;
use orderhub_realtime::Principal;

use crate::state::AppState;

/// Transport limit as a multiple of the configured inbound message size.
const TRANSPORT_LIMIT_FACTOR: usize = 4;

/// Smallest transport limit regardless of configuration.
const MIN_TRANSPORT_LIMIT: usize = 64 * 1024;

/// Query parameters of the upgrade request.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Single-use connection ticket.
    pub ticket: Option<String>,
}

/// GET /ws?ticket={ticket}
///
/// The ticket is redeemed before the upgrade; a missing, expired or reused
/// ticket is refused with 401 and no socket is opened.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let ticket = query
        .ticket
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::authentication("Missing connection ticket"))?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let principal = state.realtime.tickets.redeem(&ticket).await?;
    // Oversized frames up to this bound reach the registry, which drops them
    // and keeps the socket. Only larger ones abort the connection.
    let frame_limit = state
        .config
        .realtime
        .max_message_bytes
        .saturating_mul(TRANSPORT_LIMIT_FACTOR)
        .max(MIN_TRANSPORT_LIMIT);

    Ok(ws
        .max_message_size(frame_limit)
        .max_frame_size(frame_limit)
        .on_upgrade(move |socket| handle_socket(state, principal, socket)))
}

/// Pumps one connection until either side hangs up or the registry closes it.
async fn handle_socket(state: AppState, principal: Principal, socket: WebSocket) {
    let connections = state.realtime.connections.clone();
    let (handle, mut outbound) = connections.register(principal);
    let conn_id = handle.id;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = handle.closed() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if sink.send(Message::Text(frame.to_string().into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => connections.handle_inbound(&conn_id, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket read error");
                    break;
                }
            }
        }
    }

    connections.unregister(&conn_id);
    info!(conn_id = %conn_id, "WebSocket connection closed");
}
