//! Start (welcome) message configuration and per-recipient image history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A welcome image candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StartImage {
    /// Image id.
    pub id: i64,
    /// Public image URL.
    pub url: String,
    /// Relative selection weight. Values `<= 0` count as `1`.
    pub weight: i32,
    /// Inactive images are never chosen.
    pub is_active: bool,
}

impl StartImage {
    /// Weight used for selection.
    pub fn effective_weight(&self) -> u32 {
        if self.weight <= 0 { 1 } else { self.weight as u32 }
    }
}

/// An inline keyboard button attached to the welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartButton {
    /// Button label.
    pub text: String,
    /// Plain link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Telegram mini-app URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_app_url: Option<String>,
}

/// Welcome message configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartMessageSettings {
    /// Message template; supports `{{first_name}}`.
    #[serde(default)]
    pub text: String,
    /// Image candidates.
    #[serde(default)]
    pub images: Vec<StartImage>,
    /// Inline keyboard, one button per row.
    #[serde(default)]
    pub buttons: Vec<StartButton>,
    /// Telegram parse mode for the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

impl StartMessageSettings {
    /// Active image candidates.
    pub fn active_images(&self) -> impl Iterator<Item = &StartImage> {
        self.images.iter().filter(|img| img.is_active && !img.url.trim().is_empty())
    }
}

/// Last welcome image shown to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ImageHistory {
    /// Telegram user id.
    pub telegram_id: i64,
    /// URL of the last image shown.
    pub last_image_url: String,
    /// When the history was written.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_weight() {
        let mut img = StartImage {
            id: 1,
            url: "u".into(),
            weight: 0,
            is_active: true,
        };
        assert_eq!(img.effective_weight(), 1);
        img.weight = -3;
        assert_eq!(img.effective_weight(), 1);
        img.weight = 4;
        assert_eq!(img.effective_weight(), 4);
    }
}
