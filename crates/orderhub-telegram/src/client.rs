//! HTTP client for the Telegram Bot API.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use orderhub_core::config::TelegramConfig;

use crate::error::TelegramError;
use crate::types::{
    AnswerCallbackQuery, ApiResponse, ChatId, ChatMember, DeleteWebhook, GetChatMember,
    GetUpdates, MarkupRequest, Message, SendMessage, SendPhoto, SendVideo, SetWebhook, Update,
    User,
};

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: [&str; 2] = ["message", "callback_query"];

/// Bot API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    long_poll_timeout: Duration,
    request_timeout: Duration,
}

impl TelegramClient {
    /// Build a client from configuration. Fails when no token is configured.
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        if config.bot_token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".into()));
        }

        let request_timeout = Duration::from_secs(config.request_timeout_seconds);
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| TelegramError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            long_poll_timeout: Duration::from_secs(config.long_poll_timeout_seconds),
            request_timeout,
        })
    }

    /// Overrides the API base URL (local Bot API server, wiremock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    /// Call a Bot API method and decode its `result`.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_timeout(method, params, None).await
    }

    async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.http.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TelegramError::transport(method, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TelegramError::transport(method, e))?;
        debug!(method, status = %status, "Telegram response received");

        match serde_json::from_str::<ApiResponse<R>>(&body) {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(envelope) => Err(TelegramError::Api {
                method: method.to_string(),
                code: envelope.error_code.unwrap_or(status.as_u16()),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            }),
            Err(_) if !status.is_success() => Err(TelegramError::Api {
                method: method.to_string(),
                code: status.as_u16(),
                description: truncate(&body, 200),
                retry_after: None,
            }),
            Err(e) => Err(TelegramError::Decode {
                method: method.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Send once; if the API rejects the markup, send the same request once
    /// more without `parse_mode`.
    async fn send_with_markup_fallback<Req>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Message, TelegramError>
    where
        Req: MarkupRequest,
    {
        match self.call::<Req, Message>(method, request).await {
            Err(err) if err.is_markup_error() && request.parse_mode().is_some() => {
                warn!(method, error = %err, "Markup rejected, resending without parse_mode");
                let mut plain = request.clone();
                plain.clear_parse_mode();
                self.call(method, &plain).await
            }
            other => other,
        }
    }

    /// `sendMessage`. Returns the sent message id.
    pub async fn send_message(&self, request: &SendMessage) -> Result<i64, TelegramError> {
        self.send_with_markup_fallback("sendMessage", request)
            .await
            .map(|m| m.message_id)
    }

    /// `sendPhoto`. Returns the sent message id.
    pub async fn send_photo(&self, request: &SendPhoto) -> Result<i64, TelegramError> {
        self.send_with_markup_fallback("sendPhoto", request)
            .await
            .map(|m| m.message_id)
    }

    /// `sendVideo`. Returns the sent message id.
    pub async fn send_video(&self, request: &SendVideo) -> Result<i64, TelegramError> {
        self.send_with_markup_fallback("sendVideo", request)
            .await
            .map(|m| m.message_id)
    }

    /// `answerCallbackQuery`.
    pub async fn answer_callback_query(
        &self,
        request: &AnswerCallbackQuery,
    ) -> Result<(), TelegramError> {
        let _: bool = self.call("answerCallbackQuery", request).await?;
        Ok(())
    }

    /// Long-poll `getUpdates`. The HTTP timeout is extended past the server-side wait.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdates {
            offset,
            timeout: self.long_poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES.to_vec(),
        };
        self.call_with_timeout(
            "getUpdates",
            &params,
            Some(self.long_poll_timeout + self.request_timeout),
        )
        .await
    }

    /// `getChatMember`.
    pub async fn get_chat_member(
        &self,
        chat_id: ChatId,
        user_id: i64,
    ) -> Result<ChatMember, TelegramError> {
        self.call("getChatMember", &GetChatMember { chat_id, user_id })
            .await
    }

    /// `getMe`.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// `setWebhook`.
    pub async fn set_webhook(
        &self,
        url: &str,
        secret_token: Option<&str>,
    ) -> Result<bool, TelegramError> {
        self.call(
            "setWebhook",
            &SetWebhook {
                url,
                secret_token: secret_token.filter(|s| !s.is_empty()),
                allowed_updates: ALLOWED_UPDATES.to_vec(),
            },
        )
        .await
    }

    /// `deleteWebhook`. Polling mode calls this so `getUpdates` is allowed.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, TelegramError> {
        self.call(
            "deleteWebhook",
            &DeleteWebhook {
                drop_pending_updates,
            },
        )
        .await
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
