//! Telegram Bot API configuration.

use serde::{Deserialize, Serialize};

/// Telegram Bot API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[serde(default)]
    pub bot_token: String,
    /// API base URL (overridable for local Bot API servers).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Server-side wait for `getUpdates` in seconds.
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout_seconds: u64,
    /// Fixed delay after a failed poll, in seconds.
    #[serde(default = "default_poll_error_delay")]
    pub poll_error_delay_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout(),
            long_poll_timeout_seconds: default_long_poll_timeout(),
            poll_error_delay_seconds: default_poll_error_delay(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_long_poll_timeout() -> u64 {
    25
}

fn default_poll_error_delay() -> u64 {
    5
}
