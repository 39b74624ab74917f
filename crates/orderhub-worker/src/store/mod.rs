//! Job persistence.
//!
//! A store owns job records and the state sets they move between. Claiming
//! must be atomic: a job handed to one worker is never handed to another
//! until it is rescheduled, retried, or its claim goes stale.

pub mod memory;
pub mod redis;

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orderhub_core::result::AppResult;
use orderhub_entity::job::NotificationJob;

pub use self::memory::MemoryJobStore;
pub use self::redis::RedisJobStore;

/// Number of jobs in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Claimable now.
    pub pending: u64,
    /// Waiting for a retry delay to elapse.
    pub delayed: u64,
    /// Claimed by a worker.
    pub active: u64,
    /// Finished and not yet cleaned.
    pub completed: u64,
    /// Parked after exhausting attempts.
    pub failed: u64,
}

/// Storage backend for notification jobs.
#[async_trait]
pub trait JobStore: Send + Sync + Debug + 'static {
    /// Persist a new pending job.
    async fn insert(&self, job: &NotificationJob) -> AppResult<()>;

    /// Atomically claim the most urgent due job, marking it active and
    /// counting the attempt.
    async fn claim_next(&self, now: DateTime<Utc>) -> AppResult<Option<NotificationJob>>;

    /// Mark an active job completed.
    async fn complete(
        &self,
        job_id: Uuid,
        result: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Return an active job to pending, claimable from `run_at`.
    async fn reschedule(
        &self,
        job_id: Uuid,
        error: &str,
        run_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Park an active job as failed.
    async fn fail(&self, job_id: Uuid, error: &str, now: DateTime<Utc>) -> AppResult<()>;

    /// Release active jobs claimed at or before `claimed_before`. Jobs with
    /// attempts left become claimable at `now`; the rest are parked as failed.
    /// Returns how many moved.
    async fn recover_stalled(
        &self,
        claimed_before: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Fetch a job by id.
    async fn get(&self, job_id: Uuid) -> AppResult<Option<NotificationJob>>;

    /// Failed jobs, most recently failed first.
    async fn list_failed(&self, offset: usize, limit: usize) -> AppResult<Vec<NotificationJob>>;

    /// Reset failed jobs (all, or the given ids) to pending. Returns how many moved.
    async fn retry_failed(&self, job_ids: Option<&[Uuid]>, now: DateTime<Utc>) -> AppResult<u64>;

    /// Delete completed jobs finished at or before `cutoff`. Never touches other states.
    async fn remove_completed_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Count jobs by state.
    async fn counts(&self, now: DateTime<Utc>) -> AppResult<QueueCounts>;
}
