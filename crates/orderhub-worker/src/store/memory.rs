//! In-process job store for single-node deployments and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;
use orderhub_entity::job::{JobStatus, NotificationJob};

use super::{JobStore, QueueCounts};

#[derive(Debug)]
struct Slot {
    job: NotificationJob,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    jobs: HashMap<Uuid, Slot>,
    next_seq: u64,
}

impl State {
    fn active_mut(&mut self, job_id: Uuid) -> AppResult<&mut NotificationJob> {
        match self.jobs.get_mut(&job_id) {
            Some(slot) if slot.job.status == JobStatus::Active => Ok(&mut slot.job),
            Some(slot) => Err(AppError::conflict(format!(
                "Job {job_id} is {}, not active",
                slot.job.status
            ))),
            None => Err(AppError::not_found(format!("Job {job_id} not found"))),
        }
    }
}

/// Job store held in a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    state: Mutex<State>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, job: &NotificationJob) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.jobs.insert(
            job.id,
            Slot {
                job: job.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> AppResult<Option<NotificationJob>> {
        let mut state = self.state.lock().await;

        // Highest priority first, then oldest.
        let next = state
            .jobs
            .values()
            .filter(|s| s.job.status == JobStatus::Pending && s.job.scheduled_at <= now)
            .min_by_key(|s| (std::cmp::Reverse(s.job.priority.numeric_priority()), s.seq))
            .map(|s| s.job.id);

        let Some(job_id) = next else {
            return Ok(None);
        };
        let Some(slot) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };

        slot.job.status = JobStatus::Active;
        slot.job.attempts += 1;
        slot.job.updated_at = now;
        Ok(Some(slot.job.clone()))
    }

    async fn complete(
        &self,
        job_id: Uuid,
        result: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let job = state.active_mut(job_id)?;
        job.status = JobStatus::Completed;
        job.result = result;
        job.updated_at = now;
        job.finished_at = Some(now);
        Ok(())
    }

    async fn reschedule(
        &self,
        job_id: Uuid,
        error: &str,
        run_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let job = state.active_mut(job_id)?;
        job.status = JobStatus::Pending;
        job.last_error = Some(error.to_string());
        job.scheduled_at = run_at;
        job.updated_at = now;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let job = state.active_mut(job_id)?;
        job.status = JobStatus::Failed;
        job.last_error = Some(error.to_string());
        job.updated_at = now;
        job.finished_at = Some(now);
        Ok(())
    }

    async fn recover_stalled(
        &self,
        claimed_before: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut moved = 0;
        for slot in state.jobs.values_mut() {
            let job = &mut slot.job;
            if job.status != JobStatus::Active || job.updated_at > claimed_before {
                continue;
            }
            job.last_error = Some(error.to_string());
            job.updated_at = now;
            if job.has_attempts_left() {
                job.status = JobStatus::Pending;
                job.scheduled_at = now;
            } else {
                job.status = JobStatus::Failed;
                job.finished_at = Some(now);
            }
            moved += 1;
        }
        Ok(moved)
    }

    async fn get(&self, job_id: Uuid) -> AppResult<Option<NotificationJob>> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&job_id).map(|s| s.job.clone()))
    }

    async fn list_failed(&self, offset: usize, limit: usize) -> AppResult<Vec<NotificationJob>> {
        let state = self.state.lock().await;
        let mut failed: Vec<&Slot> = state
            .jobs
            .values()
            .filter(|s| s.job.status == JobStatus::Failed)
            .collect();
        failed.sort_by(|a, b| {
            b.job
                .finished_at
                .cmp(&a.job.finished_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(failed
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|s| s.job.clone())
            .collect())
    }

    async fn retry_failed(&self, job_ids: Option<&[Uuid]>, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut moved = 0;
        for slot in state.jobs.values_mut() {
            let selected = job_ids.is_none_or(|ids| ids.contains(&slot.job.id));
            if selected && slot.job.status == JobStatus::Failed {
                slot.job.reset_for_retry(now);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn remove_completed_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.jobs.len();
        state.jobs.retain(|_, slot| {
            !(slot.job.status == JobStatus::Completed
                && slot.job.finished_at.is_some_and(|at| at <= cutoff))
        });
        Ok((before - state.jobs.len()) as u64)
    }

    async fn counts(&self, now: DateTime<Utc>) -> AppResult<QueueCounts> {
        let state = self.state.lock().await;
        let mut counts = QueueCounts::default();
        for slot in state.jobs.values() {
            match slot.job.status {
                JobStatus::Pending if slot.job.scheduled_at > now => counts.delayed += 1,
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Active => counts.active += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use orderhub_entity::job::{JobPriority, NewNotificationJob};
    use serde_json::json;

    fn job(priority: JobPriority, now: DateTime<Utc>) -> NotificationJob {
        NotificationJob::from_new(
            NewNotificationJob::new("custom", priority, json!({})),
            3,
            now,
        )
    }

    #[tokio::test]
    async fn test_claim_order_priority_then_fifo() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        let low = job(JobPriority::Low, now);
        let normal_a = job(JobPriority::Normal, now);
        let normal_b = job(JobPriority::Normal, now);
        let critical = job(JobPriority::Critical, now);
        for j in [&low, &normal_a, &normal_b, &critical] {
            store.insert(j).await.unwrap();
        }

        let order: Vec<Uuid> = [
            store.claim_next(now).await.unwrap(),
            store.claim_next(now).await.unwrap(),
            store.claim_next(now).await.unwrap(),
            store.claim_next(now).await.unwrap(),
        ]
        .into_iter()
        .map(|j| j.unwrap().id)
        .collect();

        assert_eq!(order, vec![critical.id, normal_a.id, normal_b.id, low.id]);
        assert!(store.claim_next(now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claim_marks_active_and_counts_attempt() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        let j = job(JobPriority::Normal, now);
        store.insert(&j).await.unwrap();

        let claimed = store.claim_next(now).await.unwrap().unwrap();
        assert_eq!(claimed.status, JobStatus::Active);
        assert_eq!(claimed.attempts, 1);
        assert_eq!(store.counts(now).await.unwrap().active, 1);
    }

    #[tokio::test]
    async fn test_rescheduled_job_waits_for_run_at() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        let j = job(JobPriority::Normal, now);
        store.insert(&j).await.unwrap();
        store.claim_next(now).await.unwrap();

        let run_at = now + Duration::seconds(10);
        store.reschedule(j.id, "timeout", run_at, now).await.unwrap();

        assert!(store.claim_next(now).await.unwrap().is_none());
        assert_eq!(store.counts(now).await.unwrap().delayed, 1);
        let again = store.claim_next(run_at).await.unwrap().unwrap();
        assert_eq!(again.attempts, 2);
        assert_eq!(again.last_error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_abandoned_claim_is_released_after_lease() {
        let store = MemoryJobStore::new();
        let t0 = Utc::now();
        let j = job(JobPriority::Normal, t0);
        store.insert(&j).await.unwrap();
        store.claim_next(t0).await.unwrap().unwrap();

        // Claim is younger than the cutoff.
        let recovered = store
            .recover_stalled(t0 - Duration::seconds(1), "lease expired", t0)
            .await
            .unwrap();
        assert_eq!(recovered, 0);
        assert!(store.claim_next(t0).await.unwrap().is_none());

        let later = t0 + Duration::seconds(301);
        let recovered = store
            .recover_stalled(t0, "lease expired", later)
            .await
            .unwrap();
        assert_eq!(recovered, 1);

        let again = store.claim_next(later).await.unwrap().unwrap();
        assert_eq!(again.id, j.id);
        assert_eq!(again.attempts, 2);
        assert_eq!(again.last_error.as_deref(), Some("lease expired"));
    }

    #[tokio::test]
    async fn test_abandoned_claim_on_last_attempt_is_failed() {
        let store = MemoryJobStore::new();
        let t0 = Utc::now();
        let mut j = job(JobPriority::Normal, t0);
        j.max_attempts = 1;
        store.insert(&j).await.unwrap();
        store.claim_next(t0).await.unwrap().unwrap();

        assert_eq!(store.recover_stalled(t0, "lease expired", t0).await.unwrap(), 1);

        let parked = store.get(j.id).await.unwrap().unwrap();
        assert_eq!(parked.status, JobStatus::Failed);
        assert!(parked.finished_at.is_some());
        assert_eq!(store.list_failed(0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_requires_active() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        let j = job(JobPriority::Normal, now);
        store.insert(&j).await.unwrap();
        let err = store.complete(j.id, None, now).await.unwrap_err();
        assert_eq!(err.kind, orderhub_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_clean_only_removes_old_completed() {
        let store = MemoryJobStore::new();
        let t0 = Utc::now();
        let done = job(JobPriority::Normal, t0);
        let failed = job(JobPriority::Normal, t0);
        let pending = job(JobPriority::Low, t0);
        for j in [&done, &failed, &pending] {
            store.insert(j).await.unwrap();
        }
        store.claim_next(t0).await.unwrap();
        store.complete(done.id, None, t0).await.unwrap();
        store.claim_next(t0).await.unwrap();
        store.fail(failed.id, "boom", t0).await.unwrap();

        let removed = store
            .remove_completed_before(t0 + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(done.id).await.unwrap().is_none());
        assert!(store.get(failed.id).await.unwrap().is_some());
        assert!(store.get(pending.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_retry_selected_failed_jobs() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        let a = job(JobPriority::Normal, now);
        let b = job(JobPriority::Normal, now);
        for j in [&a, &b] {
            store.insert(j).await.unwrap();
            store.claim_next(now).await.unwrap();
            store.fail(j.id, "boom", now).await.unwrap();
        }

        assert_eq!(store.retry_failed(Some(&[a.id]), now).await.unwrap(), 1);
        let retried = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(retried.status, JobStatus::Pending);
        assert_eq!(retried.attempts, 0);
        assert_eq!(store.list_failed(0, 10).await.unwrap().len(), 1);

        assert_eq!(store.retry_failed(None, now).await.unwrap(), 1);
        assert!(store.list_failed(0, 10).await.unwrap().is_empty());
    }
}
