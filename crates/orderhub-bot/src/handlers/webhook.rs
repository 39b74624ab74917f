//! Telegram webhook ingress.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};
use tracing::warn;

use orderhub_core::error::AppError;
use orderhub_core::secret::verify_shared_secret;
use orderhub_telegram::Update;

use crate::state::BotState;

/// Header Telegram uses to echo the secret registered with `setWebhook`.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// POST /webhook/telegram
///
/// Answers `{ ok: true }` for every authenticated delivery, including ones
/// that fail to parse or process, so Telegram does not redeliver them.
pub async fn telegram_webhook(
    State(state): State<BotState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let expected = &state.config.bot.webhook_secret;
    if !expected.is_empty() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        verify_shared_secret(expected, provided).inspect_err(|_| {
            warn!("Webhook delivery with bad secret token");
        })?;
    }

    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => {
            let update_id = update.update_id;
            if let Err(e) = state.processor.process(update).await {
                warn!(update_id, error = %e, "Webhook update processing failed");
            }
        }
        Err(e) => warn!(error = %e, "Unparseable webhook update"),
    }

    Ok(Json(json!({ "ok": true })))
}
