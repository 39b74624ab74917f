//! Cache key builders for all OrderHub cache entries.
//!
//! Keys are unprefixed here; the Redis client applies the configured prefix.

use std::fmt::Display;

// ── Realtime keys ──────────────────────────────────────────

/// Single-use WebSocket connection ticket.
pub fn ws_ticket(token: &str) -> String {
    format!("ws_ticket:{token}")
}

// ── Admin session keys ─────────────────────────────────────

/// Authenticated admin session, keyed by bearer token.
pub fn admin_session(token: &str) -> String {
    format!("session:{token}")
}

// ── Settings keys ──────────────────────────────────────────

/// Cached notification settings.
pub fn notification_settings() -> String {
    "settings:notification".to_string()
}

// ── Notification queue keys ────────────────────────────────

const QUEUE: &str = "queue:notifications";

/// Hash holding one serialized job.
pub fn queue_job(job_id: impl Display) -> String {
    format!("{QUEUE}:job:{job_id}")
}

/// Sorted set of claimable job ids, scored by priority then sequence.
pub fn queue_pending() -> String {
    format!("{QUEUE}:pending")
}

/// Sorted set of jobs waiting for a retry, scored by due time (ms).
pub fn queue_delayed() -> String {
    format!("{QUEUE}:delayed")
}

/// Sorted set of claimed job ids, scored by claim time (ms).
pub fn queue_active() -> String {
    format!("{QUEUE}:active")
}

/// Sorted set of completed job ids, scored by finish time (ms).
pub fn queue_completed() -> String {
    format!("{QUEUE}:completed")
}

/// Sorted set of failed job ids, scored by finish time (ms).
pub fn queue_failed() -> String {
    format!("{QUEUE}:failed")
}

/// Hash of job id to pending score, used when a delayed job is promoted.
pub fn queue_scores() -> String {
    format!("{QUEUE}:scores")
}

/// Monotonic enqueue sequence.
pub fn queue_sequence() -> String {
    format!("{QUEUE}:seq")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_key() {
        assert_eq!(ws_ticket("abc"), "ws_ticket:abc");
    }

    #[test]
    fn test_job_key() {
        assert_eq!(queue_job("42"), "queue:notifications:job:42");
    }
}
