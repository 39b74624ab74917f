//! Start message settings, images and per-recipient image history.

use sqlx::PgPool;
use sqlx::types::Json;

use orderhub_core::error::{AppError, ErrorKind};
use orderhub_core::result::AppResult;
use orderhub_entity::settings::{StartButton, StartImage, StartMessageSettings};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    text: String,
    buttons: Json<Vec<StartButton>>,
    parse_mode: Option<String>,
}

/// Repository for the welcome message configuration.
#[derive(Debug, Clone)]
pub struct StartMessageRepository {
    pool: PgPool,
}

impl StartMessageRepository {
    /// Create a new start message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load stored settings with their images. `None` when nothing is configured.
    pub async fn load(&self) -> AppResult<Option<StartMessageSettings>> {
        let row = sqlx::query_as::<_, SettingsRow>(
            "SELECT text, buttons, parse_mode FROM start_message_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load start message", e)
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, StartImage>(
            "SELECT id, url, weight, is_active FROM start_message_images \
             ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load start images", e)
        })?;

        Ok(Some(StartMessageSettings {
            text: row.text,
            images,
            buttons: row.buttons.0,
            parse_mode: row.parse_mode,
        }))
    }

    /// URL of the last image shown to a recipient.
    pub async fn last_image(&self, telegram_id: i64) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT last_image_url FROM start_message_image_history WHERE telegram_id = $1",
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read image history", e))
    }

    /// Record the image just shown. One row per recipient.
    pub async fn record_image(&self, telegram_id: i64, url: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO start_message_image_history (telegram_id, last_image_url, updated_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (telegram_id) DO UPDATE SET last_image_url = EXCLUDED.last_image_url, \
             updated_at = NOW()",
        )
        .bind(telegram_id)
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to write image history", e)
        })?;
        Ok(())
    }
}
