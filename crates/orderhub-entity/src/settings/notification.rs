//! Notification settings entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Admin-managed notification configuration. Read-only for the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NotificationSettings {
    /// Send alerts for newly placed orders.
    pub notify_on_new_order: bool,
    /// Send alerts for status transitions.
    pub notify_on_status_change: bool,
    /// Target group chat.
    pub group_chat_id: Option<String>,
    /// City id (as a string key) to forum thread id.
    ///
    /// ```json
    /// { "1": 17, "4": "23" }
    /// ```
    pub city_thread_ids: serde_json::Value,
    /// Template for `new_order` alerts. `None` uses the built-in default.
    pub new_order_template: Option<String>,
    /// Template for `status_change` alerts.
    pub status_change_template: Option<String>,
    /// When the settings were last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            notify_on_new_order: true,
            notify_on_status_change: true,
            group_chat_id: None,
            city_thread_ids: serde_json::Value::Object(Default::default()),
            new_order_template: None,
            status_change_template: None,
            updated_at: None,
        }
    }
}

impl NotificationSettings {
    /// Forum thread configured for a city, if any.
    pub fn thread_for(&self, city_id: Option<i64>) -> Option<i64> {
        let city_id = city_id?;
        let value = self.city_thread_ids.get(city_id.to_string())?;
        match value {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Configured group chat, ignoring blank values.
    pub fn group_chat(&self) -> Option<&str> {
        self.group_chat_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thread_lookup() {
        let settings = NotificationSettings {
            city_thread_ids: json!({"1": 17, "4": "23", "9": null}),
            ..Default::default()
        };
        assert_eq!(settings.thread_for(Some(1)), Some(17));
        assert_eq!(settings.thread_for(Some(4)), Some(23));
        assert_eq!(settings.thread_for(Some(9)), None);
        assert_eq!(settings.thread_for(Some(2)), None);
        assert_eq!(settings.thread_for(None), None);
    }

    #[test]
    fn test_blank_group_chat() {
        let settings = NotificationSettings {
            group_chat_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(settings.group_chat(), None);
    }
}
