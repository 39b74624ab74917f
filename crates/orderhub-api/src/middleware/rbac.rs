//! Role checks for route guarding.

use orderhub_core::error::AppError;

use crate::extractors::AuthUser;

/// Roles allowed to manage the notification queue.
const ADMIN_ROLES: &[&str] = &["admin", "superadmin"];

/// Checks that the authenticated user has an admin role.
pub fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if !ADMIN_ROLES.contains(&auth.role.as_str()) {
        return Err(AppError::authorization("Admin access required"));
    }
    Ok(())
}
