//! Typed job payloads, checked when a job is dispatched to its handler.

use serde::{Deserialize, Deserializer, Serialize};

use super::status::JobType;
use crate::order::OrderSnapshot;

/// Why a job's payload could not be interpreted.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The job type has no handler in this build.
    #[error("unknown job type '{0}'")]
    UnknownType(String),
    /// The payload does not match the shape required by its type.
    #[error("invalid {job_type} payload: {source}")]
    Invalid {
        /// Job type whose schema was violated.
        job_type: JobType,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

/// Payload of a `new_order` or `status_change` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotification {
    /// Order fields used as template placeholders.
    #[serde(flatten)]
    pub order: OrderSnapshot,
    /// Diagnostic job: bypasses the enable flags.
    #[serde(default)]
    pub is_test: bool,
    /// Target chat overriding the configured group.
    #[serde(default, deserialize_with = "optional_chat_id", skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Forum thread overriding the per-city lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    /// Previous order status (status changes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_status: Option<String>,
}

/// Payload of a `custom` job: a pre-rendered message sent verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMessage {
    /// Target chat.
    #[serde(deserialize_with = "chat_id")]
    pub chat_id: String,
    /// Message text.
    pub text: String,
    /// Telegram parse mode (`HTML`, `Markdown`, `MarkdownV2`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    /// Inline keyboard or other reply markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<serde_json::Value>,
    /// Forum thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

/// Payload of a `broadcast` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastPayload {
    /// Target chat.
    #[serde(deserialize_with = "chat_id")]
    pub chat_id: String,
    /// Text, or caption when media is attached.
    #[serde(default)]
    pub text: String,
    /// Photo URL. Takes precedence over `video_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Video URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Telegram parse mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    /// Inline keyboard or other reply markup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<serde_json::Value>,
    /// Forum thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

impl BroadcastPayload {
    /// Media attached to the broadcast, photo first.
    pub fn media(&self) -> BroadcastMedia<'_> {
        fn non_empty(v: &Option<String>) -> Option<&str> {
            v.as_deref().filter(|s| !s.trim().is_empty())
        }
        if let Some(url) = non_empty(&self.image_url) {
            BroadcastMedia::Photo(url)
        } else if let Some(url) = non_empty(&self.video_url) {
            BroadcastMedia::Video(url)
        } else {
            BroadcastMedia::None
        }
    }
}

/// Which Telegram send method a broadcast maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMedia<'a> {
    /// `sendPhoto` with caption.
    Photo(&'a str),
    /// `sendVideo` with caption.
    Video(&'a str),
    /// `sendMessage`.
    None,
}

/// Tagged union over every job type this build can execute.
#[derive(Debug, Clone)]
pub enum JobPayload {
    /// `new_order`.
    NewOrder(OrderNotification),
    /// `status_change`.
    StatusChange(OrderNotification),
    /// `custom`.
    Custom(CustomMessage),
    /// `broadcast`.
    Broadcast(BroadcastPayload),
}

impl JobPayload {
    /// Decode `data` according to `job_type`.
    pub fn parse(job_type: &str, data: &serde_json::Value) -> Result<Self, PayloadError> {
        let kind =
            JobType::parse(job_type).ok_or_else(|| PayloadError::UnknownType(job_type.to_string()))?;
        let invalid = |source| PayloadError::Invalid {
            job_type: kind,
            source,
        };

        Ok(match kind {
            JobType::NewOrder => Self::NewOrder(decode(data).map_err(invalid)?),
            JobType::StatusChange => Self::StatusChange(decode(data).map_err(invalid)?),
            JobType::Custom => Self::Custom(decode(data).map_err(invalid)?),
            JobType::Broadcast => Self::Broadcast(decode(data).map_err(invalid)?),
        })
    }

    /// Job type of this payload.
    pub fn job_type(&self) -> JobType {
        match self {
            Self::NewOrder(_) => JobType::NewOrder,
            Self::StatusChange(_) => JobType::StatusChange,
            Self::Custom(_) => JobType::Custom,
            Self::Broadcast(_) => JobType::Broadcast,
        }
    }

    /// Serialize the payload back into job `data`.
    pub fn to_data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::NewOrder(p) | Self::StatusChange(p) => serde_json::to_value(p),
            Self::Custom(p) => serde_json::to_value(p),
            Self::Broadcast(p) => serde_json::to_value(p),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    data: &serde_json::Value,
) -> Result<T, serde_json::Error> {
    T::deserialize(data)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChatId {
    Int(i64),
    Str(String),
}

impl From<RawChatId> for String {
    fn from(raw: RawChatId) -> Self {
        match raw {
            RawChatId::Int(id) => id.to_string(),
            RawChatId::Str(s) => s,
        }
    }
}

/// Chat ids arrive as numbers from some producers and strings from others.
pub fn chat_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawChatId::deserialize(deserializer).map(String::from)
}

/// Optional form of [`chat_id`]; blank values become `None`.
pub fn optional_chat_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawChatId>::deserialize(deserializer)?
        .map(String::from)
        .filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_unknown_type() {
        let err = JobPayload::parse("fax", &json!({})).unwrap_err();
        assert!(matches!(err, PayloadError::UnknownType(t) if t == "fax"));
    }

    #[test]
    fn test_parse_invalid_custom() {
        let err = JobPayload::parse("custom", &json!({"text": "hi"})).unwrap_err();
        assert!(matches!(
            err,
            PayloadError::Invalid {
                job_type: JobType::Custom,
                ..
            }
        ));
    }

    #[test]
    fn test_numeric_chat_id_accepted() {
        let payload = JobPayload::parse("custom", &json!({"chat_id": -100123, "text": "hi"})).unwrap();
        match payload {
            JobPayload::Custom(msg) => assert_eq!(msg.chat_id, "-100123"),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_order_notification_flags() {
        let payload = JobPayload::parse(
            "new_order",
            &json!({"id": 5, "order_number": "A-5", "is_test": true, "chat_id": 42}),
        )
        .unwrap();
        match payload {
            JobPayload::NewOrder(n) => {
                assert!(n.is_test);
                assert_eq!(n.chat_id.as_deref(), Some("42"));
                assert_eq!(n.order.id, Some(5));
                assert!(!n.order.extra.contains_key("is_test"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_media_precedence() {
        let mut payload: BroadcastPayload = serde_json::from_value(json!({
            "chat_id": "1",
            "text": "hi",
            "image_url": "https://img",
            "video_url": "https://vid"
        }))
        .unwrap();
        assert_eq!(payload.media(), BroadcastMedia::Photo("https://img"));
        payload.image_url = Some("  ".into());
        assert_eq!(payload.media(), BroadcastMedia::Video("https://vid"));
        payload.video_url = None;
        assert_eq!(payload.media(), BroadcastMedia::None);
    }
}
