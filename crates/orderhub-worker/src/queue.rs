//! Notification job queue: enqueue, claim, outcome bookkeeping and admin operations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use orderhub_core::result::AppResult;
use orderhub_entity::job::{JobPayload, JobPriority, NewNotificationJob, NotificationJob};

use crate::policy::RetryPolicy;
use crate::store::{JobStore, QueueCounts};

/// Largest page returned by [`JobQueue::list_failed`].
pub const MAX_FAILED_PAGE: usize = 100;

/// What happened to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Rescheduled; claimable again after `delay`.
    Retrying {
        /// Backoff before the next attempt.
        delay: Duration,
    },
    /// Parked in the failed set.
    Failed,
}

/// Queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs claimable now
    pub pending: u64,
    /// Jobs waiting out a retry delay
    pub delayed: u64,
    /// Jobs held by a worker
    pub active: u64,
    /// Completed jobs not yet cleaned
    pub completed: u64,
    /// Failed jobs awaiting retry or inspection
    pub failed: u64,
}

impl From<QueueCounts> for QueueStats {
    fn from(counts: QueueCounts) -> Self {
        Self {
            pending: counts.pending,
            delayed: counts.delayed,
            active: counts.active,
            completed: counts.completed,
            failed: counts.failed,
        }
    }
}

/// Job queue for enqueuing and claiming notification work
#[derive(Debug, Clone)]
pub struct JobQueue {
    /// Backing store
    store: Arc<dyn JobStore>,
    /// Attempt bound and backoff curve
    policy: RetryPolicy,
}

impl JobQueue {
    /// Create a new job queue
    pub fn new(store: Arc<dyn JobStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Queue over an in-process store.
    pub fn in_memory(policy: RetryPolicy) -> Self {
        Self::new(Arc::new(crate::store::MemoryJobStore::new()), policy)
    }

    /// Retry policy applied to failed attempts.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Enqueue a new job and return its id.
    ///
    /// The type is not checked here; unknown types fail at execution.
    pub async fn enqueue(&self, new: NewNotificationJob) -> AppResult<Uuid> {
        let job = NotificationJob::from_new(new, self.policy.max_attempts, Utc::now());
        self.store.insert(&job).await?;

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            priority = %job.priority,
            "Enqueued notification job"
        );
        Ok(job.id)
    }

    /// Enqueue a typed payload.
    pub async fn enqueue_payload(&self, payload: &JobPayload, priority: JobPriority) -> AppResult<Uuid> {
        let data = payload.to_data()?;
        self.enqueue(NewNotificationJob::new(payload.job_type().as_str(), priority, data))
            .await
    }

    /// Claim the next due job, if any.
    pub async fn claim(&self) -> AppResult<Option<NotificationJob>> {
        self.store.claim_next(Utc::now()).await
    }

    /// Mark a job as completed successfully
    pub async fn complete(&self, job_id: Uuid, result: Option<serde_json::Value>) -> AppResult<()> {
        self.store.complete(job_id, result, Utc::now()).await?;
        debug!(job_id = %job_id, "Job completed");
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// Retryable errors reschedule the job with backoff while attempts remain;
    /// everything else parks it as failed.
    pub async fn record_failure(
        &self,
        job: &NotificationJob,
        error: &str,
        retryable: bool,
    ) -> AppResult<FailureOutcome> {
        let now = Utc::now();

        if retryable && job.has_attempts_left() {
            let delay = self.policy.delay_after(job.attempts);
            let run_at = chrono::Duration::from_std(delay)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.store.reschedule(job.id, error, run_at, now).await?;
            debug!(
                job_id = %job.id,
                attempt = job.attempts,
                delay_ms = delay.as_millis() as u64,
                "Job rescheduled"
            );
            return Ok(FailureOutcome::Retrying { delay });
        }

        self.store.fail(job.id, error, now).await?;
        warn!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = job.attempts,
            error = %error,
            "Job failed"
        );
        Ok(FailureOutcome::Failed)
    }

    /// Get a job by id.
    pub async fn get(&self, job_id: Uuid) -> AppResult<Option<NotificationJob>> {
        self.store.get(job_id).await
    }

    /// Page through failed jobs, newest first. `limit` is clamped to 1..=100.
    pub async fn list_failed(&self, offset: usize, limit: usize) -> AppResult<Vec<NotificationJob>> {
        let limit = limit.clamp(1, MAX_FAILED_PAGE);
        self.store.list_failed(offset, limit).await
    }

    /// Reset failed jobs (all of them when `job_ids` is `None`) and re-enqueue them.
    pub async fn retry_failed(&self, job_ids: Option<&[Uuid]>) -> AppResult<u64> {
        let moved = self.store.retry_failed(job_ids, Utc::now()).await?;
        info!(count = moved, "Failed jobs re-enqueued");
        Ok(moved)
    }

    /// Remove completed jobs that finished at least `older_than` ago.
    pub async fn clean(&self, older_than: Duration) -> AppResult<u64> {
        let now = Utc::now();
        let cutoff = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.remove_completed_before(cutoff).await?;
        if removed > 0 {
            info!(count = removed, "Cleaned completed jobs");
        }
        Ok(removed)
    }

    /// Hand out again jobs whose claim is older than `lease`.
    ///
    /// A worker that dies mid-job never reports an outcome; its claim counts
    /// as a spent attempt.
    pub async fn recover_stalled(&self, lease: Duration) -> AppResult<u64> {
        let now = Utc::now();
        let cutoff = chrono::Duration::from_std(lease)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let error = format!("Worker lease of {}s expired", lease.as_secs());
        let recovered = self.store.recover_stalled(cutoff, &error, now).await?;
        if recovered > 0 {
            warn!(count = recovered, "Recovered stalled jobs");
        }
        Ok(recovered)
    }

    /// Get queue statistics
    pub async fn stats(&self) -> AppResult<QueueStats> {
        self.store.counts(Utc::now()).await.map(QueueStats::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderhub_entity::job::JobStatus;
    use serde_json::json;

    fn queue(max_attempts: u32) -> JobQueue {
        JobQueue::in_memory(RetryPolicy::new(
            max_attempts,
            Duration::from_secs(2),
            Duration::from_secs(60),
        ))
    }

    fn custom() -> NewNotificationJob {
        NewNotificationJob::new(
            "custom",
            JobPriority::Normal,
            json!({"chat_id": "1", "text": "hi"}),
        )
    }

    #[tokio::test]
    async fn test_transient_failure_reschedules_with_backoff() {
        let queue = queue(3);
        let id = queue.enqueue(custom()).await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();

        let outcome = queue.record_failure(&job, "timeout", true).await.unwrap();
        assert_eq!(
            outcome,
            FailureOutcome::Retrying {
                delay: Duration::from_secs(2)
            }
        );

        let stored = queue.get(id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Pending);
        assert!(stored.scheduled_at > Utc::now());
        assert!(queue.claim().await.unwrap().is_none());
        assert_eq!(queue.stats().await.unwrap().delayed, 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_skips_retry() {
        let queue = queue(3);
        queue.enqueue(custom()).await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();

        let outcome = queue.record_failure(&job, "bad payload", false).await.unwrap();
        assert_eq!(outcome, FailureOutcome::Failed);
        assert_eq!(queue.stats().await.unwrap().failed, 1);
    }

    #[tokio::test]
    async fn test_last_attempt_fails_even_if_retryable() {
        let queue = queue(1);
        queue.enqueue(custom()).await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();

        let outcome = queue.record_failure(&job, "timeout", true).await.unwrap();
        assert_eq!(outcome, FailureOutcome::Failed);
    }

    #[tokio::test]
    async fn test_list_failed_limit_clamped() {
        let queue = queue(1);
        for _ in 0..3 {
            queue.enqueue(custom()).await.unwrap();
            let job = queue.claim().await.unwrap().unwrap();
            queue.record_failure(&job, "boom", false).await.unwrap();
        }

        assert_eq!(queue.list_failed(0, 0).await.unwrap().len(), 1);
        assert_eq!(queue.list_failed(1, 500).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_resets_attempts_and_reenqueues() {
        let queue = queue(1);
        let id = queue.enqueue(custom()).await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();
        queue.record_failure(&job, "boom", true).await.unwrap();

        assert_eq!(queue.retry_failed(None).await.unwrap(), 1);
        let again = queue.claim().await.unwrap().unwrap();
        assert_eq!(again.id, id);
        assert_eq!(again.attempts, 1);
    }

    #[tokio::test]
    async fn test_clean_keeps_recent_and_unfinished() {
        let queue = queue(3);
        queue.enqueue(custom()).await.unwrap();
        queue.enqueue(custom()).await.unwrap();
        let job = queue.claim().await.unwrap().unwrap();
        queue.complete(job.id, None).await.unwrap();

        assert_eq!(queue.clean(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(queue.clean(Duration::ZERO).await.unwrap(), 1);
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.pending, 1);
    }

    #[tokio::test]
    async fn test_abandoned_claim_is_reclaimable() {
        let queue = queue(3);
        let id = queue.enqueue(custom()).await.unwrap();
        queue.claim().await.unwrap().unwrap();

        assert_eq!(queue.recover_stalled(Duration::from_secs(300)).await.unwrap(), 0);
        assert!(queue.claim().await.unwrap().is_none());

        assert_eq!(queue.recover_stalled(Duration::ZERO).await.unwrap(), 1);
        let again = queue.claim().await.unwrap().unwrap();
        assert_eq!(again.id, id);
        assert_eq!(again.attempts, 2);
        assert_eq!(again.last_error.as_deref(), Some("Worker lease of 0s expired"));
    }

    #[tokio::test]
    async fn test_enqueue_payload_uses_wire_type() {
        let queue = queue(3);
        let payload = JobPayload::parse("custom", &json!({"chat_id": 5, "text": "x"})).unwrap();
        let id = queue.enqueue_payload(&payload, JobPriority::High).await.unwrap();
        let job = queue.get(id).await.unwrap().unwrap();
        assert_eq!(job.job_type, "custom");
        assert_eq!(job.priority, JobPriority::High);
        assert_eq!(job.data["chat_id"], "5");
    }
}
