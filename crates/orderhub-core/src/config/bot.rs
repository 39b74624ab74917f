//! Bot-service configuration.

use serde::{Deserialize, Serialize};

/// How the bot-service receives updates from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    /// Long-poll `getUpdates`.
    Polling,
    /// Receive pushes on `POST /webhook/telegram`.
    Webhook,
}

/// Bot-service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Update transport.
    #[serde(default = "default_mode")]
    pub mode: BotMode,
    /// Secret expected in `X-Telegram-Bot-Api-Secret-Token`. Empty disables the check.
    #[serde(default)]
    pub webhook_secret: String,
    /// Public webhook URL registered on startup in webhook mode.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Start message text used when no settings are stored.
    #[serde(default = "default_start_text")]
    pub default_start_text: String,
    /// Image sent with the start message when no active images are configured.
    #[serde(default)]
    pub default_start_image: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            mode: default_mode(),
            webhook_secret: String::new(),
            webhook_url: None,
            default_start_text: default_start_text(),
            default_start_image: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_mode() -> BotMode {
    BotMode::Polling
}

fn default_start_text() -> String {
    "Hello, {{first_name}}! Tap the button below to open the menu.".to_string()
}
