//! Pre-rendered messages sent verbatim.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use orderhub_entity::job::{JobPayload, JobType, NotificationJob};
use orderhub_telegram::{ParseMode, SendMessage, TelegramClient};

use crate::executor::{JobExecutionError, JobHandler};

/// Handles `custom` jobs
#[derive(Debug)]
pub struct CustomMessageHandler {
    telegram: TelegramClient,
}

impl CustomMessageHandler {
    /// Create a new custom message handler
    pub fn new(telegram: TelegramClient) -> Self {
        Self { telegram }
    }
}

#[async_trait]
impl JobHandler for CustomMessageHandler {
    fn job_types(&self) -> &[JobType] {
        &[JobType::Custom]
    }

    async fn execute(
        &self,
        job: &NotificationJob,
        payload: JobPayload,
    ) -> Result<Option<Value>, JobExecutionError> {
        let JobPayload::Custom(message) = payload else {
            return Err(JobExecutionError::Permanent(format!(
                "Custom message handler cannot run '{}' jobs",
                payload.job_type()
            )));
        };
        if message.text.trim().is_empty() {
            return Err(JobExecutionError::Permanent("Message text is empty".into()));
        }

        let request = SendMessage::new(message.chat_id.as_str(), message.text)
            .with_parse_mode(message.parse_mode.as_deref().and_then(ParseMode::parse))
            .with_reply_markup(message.reply_markup)
            .in_thread(message.message_thread_id);
        let message_id = self.telegram.send_message(&request).await?;

        info!(job_id = %job.id, chat_id = %message.chat_id, message_id, "Custom message sent");
        Ok(Some(json!({ "message_id": message_id, "chat_id": message.chat_id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support::{sent, telegram};
    use chrono::Utc;
    use orderhub_entity::job::{JobPriority, NewNotificationJob};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_text_sent_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_json(json!({
                "chat_id": 42,
                "text": "{{not a placeholder}} & <b>raw</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(11)))
            .expect(1)
            .mount(&server)
            .await;

        let job = NotificationJob::from_new(
            NewNotificationJob::new(
                "custom",
                JobPriority::Normal,
                json!({
                    "chat_id": "42",
                    "text": "{{not a placeholder}} & <b>raw</b>",
                    "parse_mode": "HTML"
                }),
            ),
            3,
            Utc::now(),
        );
        let payload = JobPayload::parse(&job.job_type, &job.data).unwrap();

        let handler = CustomMessageHandler::new(telegram(&server.uri()));
        let result = handler.execute(&job, payload).await.unwrap().unwrap();
        assert_eq!(result["message_id"], 11);
    }
}
