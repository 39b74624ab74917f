//! Update processing shared by the polling loop and the webhook.

use std::sync::Arc;

use tracing::{debug, warn};

use orderhub_core::result::AppResult;
use orderhub_telegram::{AnswerCallbackQuery, CallbackQuery, Message, TelegramClient, Update};

use crate::services::campaign::parse_sub_check;
use crate::services::{CampaignService, StartMessageService};

/// A bot command parsed from message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    /// Command name without the slash or bot mention.
    pub name: &'a str,
    /// Text after the command, if any.
    pub argument: Option<&'a str>,
}

/// Parse `/name[@bot] [argument]`.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, argument) = match rest.split_once(char::is_whitespace) {
        Some((head, arg)) => (head, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let name = head.split('@').next().unwrap_or(head);
    if name.is_empty() {
        return None;
    }
    Some(Command { name, argument })
}

/// Dispatches inbound updates.
#[derive(Debug, Clone)]
pub struct UpdateProcessor {
    telegram: TelegramClient,
    start: Arc<StartMessageService>,
    campaigns: Arc<CampaignService>,
}

impl UpdateProcessor {
    /// Create a processor.
    pub fn new(
        telegram: TelegramClient,
        start: Arc<StartMessageService>,
        campaigns: Arc<CampaignService>,
    ) -> Self {
        Self {
            telegram,
            start,
            campaigns,
        }
    }

    /// Process one update.
    pub async fn process(&self, update: Update) -> AppResult<()> {
        if let Some(message) = update.message {
            self.on_message(message).await
        } else if let Some(query) = update.callback_query {
            self.on_callback(query).await
        } else {
            debug!(update_id = update.update_id, "Ignoring update without message or callback");
            Ok(())
        }
    }

    async fn on_message(&self, message: Message) -> AppResult<()> {
        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return Ok(());
        };
        if command.name != "start" || message.chat.kind != "private" {
            return Ok(());
        }

        let chat_id = message.chat.id;
        if let (Some(tag), Some(user)) = (command.argument, message.from.as_ref()) {
            match self.campaigns.start(chat_id, user, tag).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => warn!(chat_id, tag, error = %e, "Campaign start failed, sending start message"),
            }
        }

        let first_name = message
            .from
            .as_ref()
            .map(|u| u.first_name.as_str())
            .unwrap_or_default();
        self.start.send(chat_id, first_name, None).await?;
        Ok(())
    }

    async fn on_callback(&self, query: CallbackQuery) -> AppResult<()> {
        if let Some(campaign_id) = query.data.as_deref().and_then(parse_sub_check) {
            return self.campaigns.check_subscription(&query, campaign_id).await;
        }

        debug!(data = ?query.data, "Unknown callback data");
        self.telegram
            .answer_callback_query(&AnswerCallbackQuery::silent(&query.id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::campaign;
    use crate::store::{MemoryCampaignStore, MemoryStartMessageStore};
    use crate::test_support::{ok_true, sent, telegram};
    use orderhub_core::config::BotConfig;
    use orderhub_entity::campaign::CampaignStatus;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn processor(server: &MockServer) -> UpdateProcessor {
        let telegram = telegram(&server.uri());
        let campaigns = Arc::new(MemoryCampaignStore::new());
        campaigns.insert(campaign(3, CampaignStatus::Active)).await;
        let start = StartMessageService::new(
            telegram.clone(),
            Arc::new(MemoryStartMessageStore::default()),
            &BotConfig::default(),
        );
        UpdateProcessor::new(
            telegram.clone(),
            Arc::new(start),
            Arc::new(CampaignService::new(telegram, campaigns)),
        )
    }

    fn start_update(text: &str, chat_type: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "from": {"id": 42, "first_name": "Ann"},
                "chat": {"id": 42, "type": chat_type},
                "text": text
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("/start spring"),
            Some(Command { name: "start", argument: Some("spring") })
        );
        assert_eq!(
            parse_command("/start@OrderHubBot"),
            Some(Command { name: "start", argument: None })
        );
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[tokio::test]
    async fn test_start_sends_welcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(1)))
            .expect(1)
            .mount(&server)
            .await;

        let processor = processor(&server).await;
        processor.process(start_update("/start", "private")).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_with_unknown_tag_sends_welcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({"text": "Hello, Ann! Tap the button below to open the menu."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(1)))
            .expect(1)
            .mount(&server)
            .await;

        let processor = processor(&server).await;
        processor.process(start_update("/start nope", "private")).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_in_group_ignored() {
        let server = MockServer::start().await;
        let processor = processor(&server).await;
        processor.process(start_update("/start", "supergroup")).await.unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_callback_answered_silently() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/answerCallbackQuery"))
            .and(body_partial_json(json!({"callback_query_id": "cb-9"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true()))
            .expect(1)
            .mount(&server)
            .await;

        let update: Update = serde_json::from_value(json!({
            "update_id": 2,
            "callback_query": {"id": "cb-9", "from": {"id": 42, "first_name": "Ann"}, "data": "menu"}
        }))
        .unwrap();
        processor(&server).await.process(update).await.unwrap();
    }
}
