//! `InternalCaller` extractor: gates service-to-service routes on the shared secret.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use orderhub_core::error::AppError;
use orderhub_core::secret::verify_shared_secret;

use crate::state::AppState;

/// Marker proving the request carried the internal shared secret.
#[derive(Debug, Clone, Copy)]
pub struct InternalCaller;

impl FromRequestParts<AppState> for InternalCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
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
