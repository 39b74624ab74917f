//! Shared-secret checks for service-to-service and webhook requests.

use crate::error::AppError;
use crate::result::AppResult;

/// Verify a shared secret presented by a caller.
///
/// An empty `expected` secret rejects every request.
pub fn verify_shared_secret(expected: &str, provided: Option<&str>) -> AppResult<()> {
    if expected.is_empty() {
        return Err(AppError::authentication("Internal secret not configured"));
    }
    match provided {
        Some(value) if constant_time_eq(expected.as_bytes(), value.as_bytes()) => Ok(()),
        Some(_) => Err(AppError::authentication("Invalid internal secret")),
        None => Err(AppError::authentication("Missing internal secret")),
    }
}

/// Byte comparison whose duration does not depend on where inputs differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_shared_secret() {
        assert!(verify_shared_secret("s3cret", Some("s3cret")).is_ok());
        assert!(verify_shared_secret("s3cret", Some("s3cre")).unwrap_err().is_authentication());
        assert!(verify_shared_secret("s3cret", None).unwrap_err().is_authentication());
        assert!(verify_shared_secret("", Some("")).is_err());
    }
}
