//! Request and response bodies of the internal API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;
use orderhub_entity::campaign::CampaignStatus;
use orderhub_entity::job::BroadcastPayload;
use orderhub_entity::settings::StartMessageSettings;


/// Body of `POST /internal/telegram/notification`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotificationRequest {
    /// Target chat; numeric ids may arrive as strings.
    #[serde(deserialize_with = "orderhub_entity::job::payload::chat_id")]
    pub telegram_id: String,
    /// Message text.
    #[validate(length(min = 1, max = 4096))]
    pub message: String,
    /// Parse mode; HTML when omitted.
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub reply_markup: Option<serde_json::Value>,
    #[serde(default)]
    pub message_thread_id: Option<i64>,
}

/// Body of `POST /internal/telegram/broadcast`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[serde(deserialize_with = "orderhub_entity::job::payload::chat_id")]
    pub telegram_id: String,
    /// Text, or caption when media is attached.
    #[validate(length(max = 4096))]
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub reply_markup: Option<serde_json::Value>,
    #[serde(default)]
    pub message_thread_id: Option<i64>,
}

impl From<BroadcastRequest> for BroadcastPayload {
    fn from(request: BroadcastRequest) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            chat_id: request.telegram_id,
            text: request.text,
            image_url: non_blank(request.image_url),
            video_url: non_blank(request.video_url),
            parse_mode: request.parse_mode,
            reply_markup: request.reply_markup,
            message_thread_id: request.message_thread_id,
        }
    }
}

/// Body of `POST /internal/telegram/start-message`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartMessageRequest {
    pub telegram_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    /// Settings to preview instead of the stored ones.
    #[serde(default)]
    pub settings: Option<StartMessageSettings>,
}

/// Body of `POST /internal/telegram/answer-callback`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerCallbackRequest {
    #[validate(length(min = 1))]
    pub callback_query_id: String,
    /// Notification text, up to 200 characters.
    #[validate(length(max = 200))]
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub show_alert: Option<bool>,
}

/// Body of `POST /internal/campaigns/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignStatusRequest {
    pub status: CampaignStatus,
}

/// Result of an internal send.
///
/// Telegram failures are reported in the body with a 200 status; only
/// authentication and validation failures use error statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InternalResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message_id: None,
            error: None,
        }
    }

    pub fn sent(message_id: i64) -> Self {
        Self {
            message_id: Some(message_id),
            ..Self::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Run `validator` and map failures to a validation error.
pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_telegram_id_is_accepted() {
        let request: NotificationRequest =
            serde_json::from_value(json!({"telegram_id": -1001234, "message": "hi"})).unwrap();
        assert_eq!(request.telegram_id, "-1001234");
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_oversized_message_rejected() {
        let request: NotificationRequest = serde_json::from_value(json!({
            "telegram_id": "42",
            "message": "x".repeat(4097)
        }))
        .unwrap();
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_broadcast_drops_blank_media() {
        let request: BroadcastRequest = serde_json::from_value(json!({
            "telegram_id": 42,
            "text": "Sale",
            "image_url": "  ",
            "video_url": "https://cdn.example/v.mp4"
        }))
        .unwrap();
        let payload = BroadcastPayload::from(request);
        assert_eq!(payload.image_url, None);
        assert_eq!(payload.video_url.as_deref(), Some("https://cdn.example/v.mp4"));
    }

    #[test]
    fn test_failed_response_shape() {
        let body = serde_json::to_value(InternalResponse::failed("chat not found")).unwrap();
        assert_eq!(body, json!({"success": false, "error": "chat not found"}));
    }
}
