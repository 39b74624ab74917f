//! Internal send API called by the backend.

use axum::Json;
use axum::extract::{Path, State};
use tracing::{info, warn};

use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;
use orderhub_entity::campaign::SubscriptionCampaign;
use orderhub_entity::job::BroadcastPayload;
use orderhub_telegram::{AnswerCallbackQuery, ParseMode, SendMessage};
use orderhub_worker::jobs::broadcast::deliver;

use crate::dto::{
    AnswerCallbackRequest, BroadcastRequest, CampaignStatusRequest, InternalResponse,
    NotificationRequest, StartMessageRequest, validate_request,
};
use crate::extractors::InternalCaller;
use crate::state::BotState;

/// POST /internal/telegram/notification
pub async fn send_notification(
    State(state): State<BotState>,
    _caller: InternalCaller,
    Json(request): Json<NotificationRequest>,
) -> AppResult<Json<InternalResponse>> {
    validate_request(&request)?;
    if request.message.trim().is_empty() {
        return Err(AppError::validation("message must not be blank"));
    }

    let parse_mode = match request.parse_mode.as_deref() {
        Some(mode) => ParseMode::parse(mode),
        None => Some(ParseMode::Html),
    };
    let send = SendMessage::new(request.telegram_id.as_str(), request.message)
        .with_parse_mode(parse_mode)
        .with_reply_markup(request.reply_markup)
        .in_thread(request.message_thread_id);

    let response = match state.telegram.send_message(&send).await {
        Ok(message_id) => {
            info!(chat_id = %request.telegram_id, message_id, "Notification sent");
            InternalResponse::sent(message_id)
        }
        Err(e) => {
            warn!(chat_id = %request.telegram_id, error = %e, "Notification send failed");
            InternalResponse::failed(e.to_string())
        }
    };
    Ok(Json(response))
}

/// POST /internal/telegram/broadcast
pub async fn send_broadcast(
    State(state): State<BotState>,
    _caller: InternalCaller,
    Json(request): Json<BroadcastRequest>,
) -> AppResult<Json<InternalResponse>> {
    validate_request(&request)?;
    let payload = BroadcastPayload::from(request);
    if payload.text.trim().is_empty() && payload.image_url.is_none() && payload.video_url.is_none() {
        return Err(AppError::validation("broadcast needs text, image_url or video_url"));
    }

    let response = match deliver(&state.telegram, &payload).await {
        Ok((media, message_id)) => {
            info!(chat_id = %payload.chat_id, media, message_id, "Broadcast sent");
            InternalResponse::sent(message_id)
        }
        Err(e) => {
            warn!(chat_id = %payload.chat_id, error = %e, "Broadcast send failed");
            InternalResponse::failed(e.to_string())
        }
    };
    Ok(Json(response))
}

/// POST /internal/telegram/start-message
pub async fn send_start_message(
    State(state): State<BotState>,
    _caller: InternalCaller,
    Json(request): Json<StartMessageRequest>,
) -> AppResult<Json<InternalResponse>> {
    let first_name = request.first_name.as_deref().unwrap_or_default();

    let response = match state
        .start
        .send(request.telegram_id, first_name, request.settings)
        .await
    {
        Ok(message_id) => InternalResponse::sent(message_id),
        Err(e) => {
            warn!(chat_id = request.telegram_id, error = %e, "Start message send failed");
            InternalResponse::failed(e.message)
        }
    };
    Ok(Json(response))
}

/// POST /internal/telegram/answer-callback
pub async fn answer_callback(
    State(state): State<BotState>,
    _caller: InternalCaller,
    Json(request): Json<AnswerCallbackRequest>,
) -> AppResult<Json<InternalResponse>> {
    validate_request(&request)?;

    let answer = AnswerCallbackQuery {
        callback_query_id: request.callback_query_id,
        text: request.text.filter(|t| !t.trim().is_empty()),
        show_alert: request.show_alert,
    };
    let response = match state.telegram.answer_callback_query(&answer).await {
        Ok(()) => InternalResponse::ok(),
        Err(e) => {
            warn!(callback_query_id = %answer.callback_query_id, error = %e, "Callback answer failed");
            InternalResponse::failed(e.to_string())
        }
    };
    Ok(Json(response))
}

/// POST /internal/campaigns/{id}/status
pub async fn update_campaign_status(
    State(state): State<BotState>,
    _caller: InternalCaller,
    Path(id): Path<i64>,
    Json(request): Json<CampaignStatusRequest>,
) -> AppResult<Json<SubscriptionCampaign>> {
    let campaign = state
        .campaigns
        .store()
        .update_status(id, request.status)
        .await?;
    info!(campaign_id = id, status = %campaign.status, "Campaign status changed");
    Ok(Json(campaign))
}
