//! Subscription campaign flow.
//!
//! `/start <tag>` enrolls the user in an active campaign and sends its prompt
//! with a "check subscription" button. Pressing the button checks channel
//! membership and hands out the reward once.

use std::sync::Arc;

use tracing::{info, warn};

use orderhub_core::result::AppResult;
use orderhub_entity::campaign::SubscriptionCampaign;
use orderhub_telegram::{
    AnswerCallbackQuery, CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup,
    ParseMode, SendMessage, TelegramClient, User,
};

use crate::store::CampaignStore;

/// Callback data prefix of the "check subscription" button.
pub const SUB_CHECK_PREFIX: &str = "sub_check:";

const NOT_SUBSCRIBED: &str = "Please subscribe to the channel first, then tap the button again.";
const CHECK_FAILED: &str = "Could not check your subscription. Please try again later.";
const CAMPAIGN_CLOSED: &str = "This campaign is no longer running.";
const ALREADY_REWARDED: &str = "You have already received your reward.";

/// Runs subscription campaigns.
#[derive(Debug, Clone)]
pub struct CampaignService {
    telegram: TelegramClient,
    store: Arc<dyn CampaignStore>,
}

impl CampaignService {
    /// Create the service.
    pub fn new(telegram: TelegramClient, store: Arc<dyn CampaignStore>) -> Self {
        Self { telegram, store }
    }

    /// Campaign store.
    pub fn store(&self) -> &Arc<dyn CampaignStore> {
        &self.store
    }

    /// Handle `/start <tag>`.
    ///
    /// Returns `false` when the tag does not name an active campaign; the
    /// caller then sends the ordinary start message.
    pub async fn start(&self, chat_id: i64, user: &User, tag: &str) -> AppResult<bool> {
        let campaign = match self.store.find_by_tag(tag).await? {
            Some(c) if c.status.accepts_participants() => c,
            Some(c) => {
                info!(tag, status = %c.status, "Campaign not active, falling back to start message");
                return Ok(false);
            }
            None => return Ok(false),
        };

        self.store.record_started(campaign.id, user.id).await?;

        let request = SendMessage::new(chat_id, campaign.prompt_text.clone())
            .with_parse_mode(Some(ParseMode::Html))
            .with_reply_markup(prompt_keyboard(&campaign));
        self.telegram.send_message(&request).await?;

        info!(campaign_id = campaign.id, user_id = user.id, "Campaign prompt sent");
        Ok(true)
    }

    /// Handle a `sub_check:<id>` callback.
    pub async fn check_subscription(&self, query: &CallbackQuery, campaign_id: i64) -> AppResult<()> {
        let campaign = match self.store.find_by_id(campaign_id).await? {
            Some(c) if c.status.accepts_participants() => c,
            _ => return self.alert(query, CAMPAIGN_CLOSED).await,
        };

        let member = self
            .telegram
            .get_chat_member(ChatId::from(campaign.channel_id.as_str()), query.from.id)
            .await;

        match member {
            Ok(member) if member.is_member() => {}
            Ok(member) => {
                info!(campaign_id, user_id = query.from.id, status = %member.status, "User not subscribed");
                return self.alert(query, NOT_SUBSCRIBED).await;
            }
            Err(e) => {
                warn!(campaign_id, user_id = query.from.id, error = %e, "Membership check failed");
                return self.alert(query, CHECK_FAILED).await;
            }
        }

        if !self.store.mark_subscribed(campaign.id, query.from.id).await? {
            return self.alert(query, ALREADY_REWARDED).await;
        }

        self.telegram
            .answer_callback_query(&AnswerCallbackQuery::silent(&query.id))
            .await?;

        let chat_id = query
            .message
            .as_ref()
            .map(|m| m.chat.id)
            .unwrap_or(query.from.id);
        let reward = SendMessage::new(chat_id, campaign.reward_text.clone())
            .with_parse_mode(Some(ParseMode::Html));
        self.telegram.send_message(&reward).await?;

        info!(campaign_id, user_id = query.from.id, "Campaign reward sent");
        Ok(())
    }

    async fn alert(&self, query: &CallbackQuery, text: &str) -> AppResult<()> {
        let answer = AnswerCallbackQuery {
            callback_query_id: query.id.clone(),
            text: Some(text.to_string()),
            show_alert: Some(true),
        };
        self.telegram.answer_callback_query(&answer).await?;
        Ok(())
    }
}

/// Parse `sub_check:<id>` callback data.
pub fn parse_sub_check(data: &str) -> Option<i64> {
    data.strip_prefix(SUB_CHECK_PREFIX)?.trim().parse().ok()
}

fn prompt_keyboard(campaign: &SubscriptionCampaign) -> Option<serde_json::Value> {
    let mut buttons = Vec::with_capacity(2);
    if let Some(url) = campaign.channel_url.as_deref().filter(|u| !u.trim().is_empty()) {
        buttons.push(InlineKeyboardButton::url("Subscribe", url));
    }
    buttons.push(InlineKeyboardButton::callback(
        "Check subscription",
        format!("{SUB_CHECK_PREFIX}{}", campaign.id),
    ));
    InlineKeyboardMarkup::single_column(buttons).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCampaignStore;
    use crate::store::test_support::campaign;
    use crate::test_support::{ok_true, sent, telegram};
    use orderhub_entity::campaign::{CampaignStatus, ParticipantStatus};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user() -> User {
        serde_json::from_value(json!({"id": 42, "first_name": "Ann"})).unwrap()
    }

    fn callback(data: &str) -> CallbackQuery {
        serde_json::from_value(json!({
            "id": "cb-1",
            "from": {"id": 42, "first_name": "Ann"},
            "message": {"message_id": 9, "chat": {"id": 42, "type": "private"}},
            "data": data
        }))
        .unwrap()
    }

    async fn setup(server: &MockServer, status: CampaignStatus) -> (Arc<MemoryCampaignStore>, CampaignService) {
        let store = Arc::new(MemoryCampaignStore::new());
        store.insert(campaign(3, status)).await;
        let service = CampaignService::new(telegram(&server.uri()), store.clone());
        (store, service)
    }

    async fn mock_member(server: &MockServer, status: &str) {
        Mock::given(method("POST"))
            .and(path("/botTEST/getChatMember"))
            .and(body_partial_json(json!({"chat_id": "@orderhub_news", "user_id": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"status": status}
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_sub_check() {
        assert_eq!(parse_sub_check("sub_check:17"), Some(17));
        assert_eq!(parse_sub_check("sub_check:x"), None);
        assert_eq!(parse_sub_check("menu"), None);
    }

    #[tokio::test]
    async fn test_start_active_campaign_sends_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": 42,
                "reply_markup": {"inline_keyboard": [
                    [{"text": "Subscribe", "url": "https://t.me/orderhub_news"}],
                    [{"text": "Check subscription", "callback_data": "sub_check:3"}]
                ]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(1)))
            .expect(1)
            .mount(&server)
            .await;

        let (store, service) = setup(&server, CampaignStatus::Active).await;
        assert!(service.start(42, &user(), "spring").await.unwrap());
        assert_eq!(store.participant(3, 42).await, Some(ParticipantStatus::Started));
    }

    #[tokio::test]
    async fn test_start_inactive_or_unknown_tag_falls_back() {
        let server = MockServer::start().await;
        let (store, service) = setup(&server, CampaignStatus::Paused).await;

        assert!(!service.start(42, &user(), "spring").await.unwrap());
        assert!(!service.start(42, &user(), "winter").await.unwrap());
        assert_eq!(store.participant(3, 42).await, None);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_member_gets_reward_once() {
        let server = MockServer::start().await;
        mock_member(&server, "administrator").await;
        Mock::given(method("POST"))
            .and(path("/botTEST/answerCallbackQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({"text": "Thanks! Your promo code: SPRING24"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(2)))
            .expect(1)
            .mount(&server)
            .await;

        let (store, service) = setup(&server, CampaignStatus::Active).await;
        service.check_subscription(&callback("sub_check:3"), 3).await.unwrap();
        assert_eq!(store.participant(3, 42).await, Some(ParticipantStatus::Subscribed));

        // Second press: alert only, no second reward.
        service.check_subscription(&callback("sub_check:3"), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_member_gets_alert() {
        let server = MockServer::start().await;
        mock_member(&server, "left").await;
        Mock::given(method("POST"))
            .and(path("/botTEST/answerCallbackQuery"))
            .and(body_partial_json(json!({
                "callback_query_id": "cb-1",
                "text": NOT_SUBSCRIBED,
                "show_alert": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true()))
            .expect(1)
            .mount(&server)
            .await;

        let (store, service) = setup(&server, CampaignStatus::Active).await;
        service.check_subscription(&callback("sub_check:3"), 3).await.unwrap();
        assert_eq!(store.participant(3, 42).await, None);
    }
}
