//! `AuthUser` extractor: resolves the bearer token to an admin session.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use orderhub_cache::keys;
use orderhub_core::error::AppError;
use orderhub_realtime::Principal;

use crate::state::AppState;

/// Authenticated admin available in handlers.
///
/// Sessions are written to the shared cache by the admin login flow as
/// `{ user_id, role }` under `session:{token}`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    /// Returns the inner principal.
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Principal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let principal = state
            .cache
            .get_json::<Principal>(&keys::admin_session(token))
            .await?
            .ok_or_else(|| AppError::authentication("Session expired or invalid"))?;

        Ok(AuthUser(principal))
    }
}
