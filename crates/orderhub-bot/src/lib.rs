//! # orderhub-bot
//!
//! The Telegram bot-service. It owns every conversation with Telegram that is
//! not a queued notification:
//!
//! - an internal HTTP API the backend calls to send messages, broadcasts,
//!   start messages and callback answers
//! - update ingress, either long-polling `getUpdates` or a webhook
//! - `/start` handling with weighted welcome images and subscription
//!   campaign deep links

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod polling;
pub mod router;
pub mod services;
pub mod state;
pub mod store;
pub mod update;

pub use polling::PollingLoop;
pub use router::build_router;
pub use state::BotState;
pub use update::UpdateProcessor;

#[cfg(test)]
pub(crate) mod test_support {
    use orderhub_core::config::TelegramConfig;
    use orderhub_telegram::TelegramClient;
    use serde_json::json;

    pub fn telegram(base_url: &str) -> TelegramClient {
        let config = TelegramConfig {
            bot_token: "TEST".into(),
            ..Default::default()
        };
        TelegramClient::new(&config).unwrap().with_base_url(base_url)
    }

    pub fn sent(message_id: i64) -> serde_json::Value {
        json!({
            "ok": true,
            "result": {"message_id": message_id, "chat": {"id": 42, "type": "private"}, "date": 0}
        })
    }

    pub fn ok_true() -> serde_json::Value {
        json!({"ok": true, "result": true})
    }
}
