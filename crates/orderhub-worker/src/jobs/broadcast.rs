//! Campaign broadcasts with optional photo or video.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use orderhub_entity::job::{
    BroadcastMedia, BroadcastPayload, JobPayload, JobType, NotificationJob,
};
use orderhub_telegram::{ParseMode, SendMessage, SendPhoto, SendVideo, TelegramClient};

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `broadcast` jobs
#[derive(Debug)]
pub struct BroadcastHandler {
    telegram: TelegramClient,
}

impl BroadcastHandler {
    /// Create a new broadcast handler
    pub fn new(telegram: TelegramClient) -> Self {
        Self { telegram }
    }
}

#[async_trait]
impl JobHandler for BroadcastHandler {
    fn job_types(&self) -> &[JobType] {
        &[JobType::Broadcast]
    }

    async fn execute(
        &self,
        job: &NotificationJob,
        payload: JobPayload,
    ) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::Broadcast(broadcast) = payload else {
            return Err(JobExecutionError::Permanent(format!(
                "Broadcast handler cannot run '{}' jobs",
                payload.job_type()
            )));
        };

        let (media, message_id) = deliver(&self.telegram, &broadcast).await?;

        info!(job_id = %job.id, chat_id = %broadcast.chat_id, media, message_id, "Broadcast sent");
        Ok(Some(json!({
            "message_id": message_id,
            "chat_id": broadcast.chat_id,
            "media": media,
        })))
    }
}

/// Send a broadcast: photo, else video, else plain text.
///
/// Returns the media kind (`photo`, `video` or `text`) and the message id.
pub async fn deliver(
    telegram: &TelegramClient,
    broadcast: &BroadcastPayload,
) -> Result<(&'static str, i64), JobExecutionError> {
    let parse_mode = broadcast.parse_mode.as_deref().and_then(ParseMode::parse);
    let caption = Some(broadcast.text.clone()).filter(|t| !t.trim().is_empty());
    let chat_id = broadcast.chat_id.as_str();

    let sent = match broadcast.media() {
        BroadcastMedia::Photo(url) => {
            let request = SendPhoto {
                chat_id: chat_id.into(),
                photo: url.to_string(),
                caption,
                parse_mode,
                reply_markup: broadcast.reply_markup.clone(),
                message_thread_id: broadcast.message_thread_id,
            };
            ("photo", telegram.send_photo(&request).await?)
        }
        BroadcastMedia::Video(url) => {
            let request = SendVideo {
                chat_id: chat_id.into(),
                video: url.to_string(),
                caption,
                parse_mode,
                reply_markup: broadcast.reply_markup.clone(),
                message_thread_id: broadcast.message_thread_id,
            };
            ("video", telegram.send_video(&request).await?)
        }
        BroadcastMedia::None => {
            let Some(text) = caption else {
                return Err(JobExecutionError::Permanent(
                    "Broadcast has neither text nor media".into(),
                ));
            };
            let request = SendMessage::new(chat_id, text)
                .with_parse_mode(parse_mode)
                .with_reply_markup(broadcast.reply_markup.clone())
                .in_thread(broadcast.message_thread_id);
            ("text", telegram.send_message(&request).await?)
        }
    };
    Ok(sent)
}
