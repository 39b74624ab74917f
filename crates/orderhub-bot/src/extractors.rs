//! `InternalCaller` extractor: only the backend may call `/internal` routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use orderhub_core::error::AppError;
use orderhub_core::secret::verify_shared_secret;

use crate::state::BotState;

/// Marker proving the request carried the internal shared secret.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

impl FromRequestParts<BotState> for InternalCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BotState,
    ) -> Result<Self, Self::Rejection> {
        let internal = &state.config.internal;
        let provided = parts
            .headers
            .get(internal.header.as_str())
            .and_then(|v| v.to_str().ok());

        verify_shared_secret(&internal.shared_secret, provided).inspect_err(|e| {
            warn!(path = %parts.uri.path(), error = %e.message, "Internal request rejected");
        })?;
        Ok(InternalCaller)
    }
}
