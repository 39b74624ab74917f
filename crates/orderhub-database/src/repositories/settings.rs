//! Notification settings repository.

use sqlx::PgPool;

use orderhub_core::error::{AppError, ErrorKind};
use orderhub_core::result::AppResult;
use orderhub_entity::settings::NotificationSettings;

/// Read access to the admin-managed notification settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load notification settings; a missing row yields the defaults.
    pub async fn notification_settings(&self) -> AppResult<NotificationSettings> {
        let row = sqlx::query_as::<_, NotificationSettings>(
            "SELECT notify_on_new_order, notify_on_status_change, group_chat_id, city_thread_ids, \
             new_order_template, status_change_template, updated_at \
             FROM notification_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load notification settings", e)
        })?;

        Ok(row.unwrap_or_default())
    }
}
