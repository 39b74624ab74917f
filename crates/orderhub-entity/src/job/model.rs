//! Notification job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{JobPriority, JobStatus};

/// A queued unit of notification work with retry bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    /// Unique job identifier (UUID v7, time-ordered).
    pub id: Uuid,
    /// Job type (e.g., `"new_order"`, `"broadcast"`).
    pub job_type: String,
    /// Job priority.
    pub priority: JobPriority,
    /// Type-specific payload (JSON).
    pub data: serde_json::Value,
    /// Current job status.
    pub status: JobStatus,
    /// Number of attempts started so far.
    pub attempts: u32,
    /// Attempts allowed before the job is parked as failed.
    pub max_attempts: u32,
    /// Error message of the most recent failed attempt.
    pub last_error: Option<String>,
    /// Handler result on completion (JSON).
    pub result: Option<serde_json::Value>,
    /// Earliest time the job may be claimed.
    pub scheduled_at: DateTime<Utc>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl NotificationJob {
    /// Build a pending job from a creation request.
    pub fn from_new(new: NewNotificationJob, max_attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            job_type: new.job_type,
            priority: new.priority,
            data: new.data,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            last_error: None,
            result: None,
            scheduled_at: now,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    /// Whether another attempt is allowed after the current one fails.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Reset retry bookkeeping and make the job immediately claimable.
    pub fn reset_for_retry(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Pending;
        self.attempts = 0;
        self.last_error = None;
        self.result = None;
        self.scheduled_at = now;
        self.updated_at = now;
        self.finished_at = None;
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotificationJob {
    /// Job type identifier.
    pub job_type: String,
    /// Priority.
    #[serde(default)]
    pub priority: JobPriority,
    /// Job-specific payload.
    pub data: serde_json::Value,
}

impl NewNotificationJob {
    /// Convenience constructor.
    pub fn new(job_type: impl Into<String>, priority: JobPriority, data: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            priority,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_starts_pending() {
        let now = Utc::now();
        let job = NotificationJob::from_new(
            NewNotificationJob::new("custom", JobPriority::High, serde_json::json!({})),
            5,
            now,
        );
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.scheduled_at, now);
        assert!(job.has_attempts_left());
    }

    #[test]
    fn test_reset_for_retry_clears_bookkeeping() {
        let now = Utc::now();
        let mut job = NotificationJob::from_new(
            NewNotificationJob::new("custom", JobPriority::Normal, serde_json::json!({})),
            3,
            now,
        );
        job.attempts = 3;
        job.status = JobStatus::Failed;
        job.last_error = Some("boom".into());
        job.finished_at = Some(now);

        job.reset_for_retry(now);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert!(job.last_error.is_none());
        assert!(job.finished_at.is_none());
    }
}
