//! Redis-backed job store.
//!
//! Layout (all keys under the client prefix):
//! - `queue:notifications:job:{id}`: the job record as JSON
//! - `pending`: zset scored by priority band then enqueue sequence
//! - `delayed`: zset scored by due time in milliseconds
//! - `active`: zset of claimed ids scored by claim time in milliseconds
//! - `completed` / `failed`: zsets scored by finish time in milliseconds
//! - `scores`: hash of id to pending score, reused on promotion and retry

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};
use uuid::Uuid;

use orderhub_cache::keys;
use orderhub_cache::redis::RedisClient;
use orderhub_cache::redis::client::map_redis_err;
use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;
use orderhub_entity::job::{JobPriority, JobStatus, NotificationJob};

use super::{JobStore, QueueCounts};

/// Width of one priority band in the pending score.
const PRIORITY_BAND: f64 = 1e12;

/// Promote due delayed jobs, then pop the lowest pending score into `active`
/// stamped with the claim time.
const CLAIM_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
for _, id in ipairs(due) do
  local score = redis.call('HGET', KEYS[3], id)
  redis.call('ZREM', KEYS[1], id)
  redis.call('ZADD', KEYS[2], score or 0, id)
end
local popped = redis.call('ZPOPMIN', KEYS[2])
if #popped == 0 then
  return false
end
redis.call('ZADD', KEYS[4], ARGV[1], popped[1])
return popped[1]
"#;

/// Pending score: more urgent priorities sort first, then FIFO.
fn pending_score(priority: JobPriority, seq: i64) -> f64 {
    f64::from(4 - priority.numeric_priority()) * PRIORITY_BAND + seq as f64
}

/// Job store shared by every backend instance through Redis.
#[derive(Debug, Clone)]
pub struct RedisJobStore {
    client: RedisClient,
    claim: redis::Script,
}

impl RedisJobStore {
    /// Create a store over an existing Redis client.
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            claim: redis::Script::new(CLAIM_SCRIPT),
        }
    }

    fn key(&self, key: String) -> String {
        self.client.prefixed_key(&key)
    }

    fn job_key(&self, job_id: Uuid) -> String {
        self.key(keys::queue_job(job_id))
    }

    async fn load(&self, conn: &mut ConnectionManager, job_id: Uuid) -> AppResult<Option<NotificationJob>> {
        let raw: Option<String> = conn.get(self.job_key(job_id)).await.map_err(map_redis_err)?;
        raw.map(|json| serde_json::from_str(&json).map_err(AppError::from))
            .transpose()
    }

    async fn load_active(&self, conn: &mut ConnectionManager, job_id: Uuid) -> AppResult<NotificationJob> {
        let job = self
            .load(conn, job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} not found")))?;
        if job.status != JobStatus::Active {
            return Err(AppError::conflict(format!(
                "Job {job_id} is {}, not active",
                job.status
            )));
        }
        Ok(job)
    }

    async fn next_score(&self, conn: &mut ConnectionManager, priority: JobPriority) -> AppResult<f64> {
        let seq: i64 = conn
            .incr(self.key(keys::queue_sequence()), 1)
            .await
            .map_err(map_redis_err)?;
        Ok(pending_score(priority, seq))
    }
}

#[async_trait]
impl JobStore for RedisJobStore {
    async fn insert(&self, job: &NotificationJob) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let score = self.next_score(&mut conn, job.priority).await?;
        let id = job.id.to_string();

        redis::pipe()
            .atomic()
            .set(self.job_key(job.id), serde_json::to_string(job)?)
            .ignore()
            .hset(self.key(keys::queue_scores()), &id, score)
            .ignore()
            .zadd(self.key(keys::queue_pending()), &id, score)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)?;

        debug!(job_id = %job.id, score, "Job stored");
        Ok(())
    }

    async fn claim_next(&self, now: DateTime<Utc>) -> AppResult<Option<NotificationJob>> {
        let mut conn = self.client.conn_mut();
        let claimed: Option<String> = self
            .claim
            .key(self.key(keys::queue_delayed()))
            .key(self.key(keys::queue_pending()))
            .key(self.key(keys::queue_scores()))
            .key(self.key(keys::queue_active()))
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        let Some(raw_id) = claimed else {
            return Ok(None);
        };
        let job_id = Uuid::parse_str(&raw_id)
            .map_err(|e| AppError::internal(format!("Corrupt job id '{raw_id}' in queue: {e}")))?;

        let Some(mut job) = self.load(&mut conn, job_id).await? else {
            warn!(job_id = %job_id, "Claimed job has no record, dropping");
            let _: () = conn
                .zrem(self.key(keys::queue_active()), &raw_id)
                .await
                .map_err(map_redis_err)?;
            return Ok(None);
        };

        job.status = JobStatus::Active;
        job.attempts += 1;
        job.updated_at = now;
        let _: () = conn
            .set(self.job_key(job_id), serde_json::to_string(&job)?)
            .await
            .map_err(map_redis_err)?;
        Ok(Some(job))
    }

    async fn complete(
        &self,
        job_id: Uuid,
        result: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let mut job = self.load_active(&mut conn, job_id).await?;
        job.status = JobStatus::Completed;
        job.result = result;
        job.updated_at = now;
        job.finished_at = Some(now);

        let id = job_id.to_string();
        redis::pipe()
            .atomic()
            .set(self.job_key(job_id), serde_json::to_string(&job)?)
            .ignore()
            .zrem(self.key(keys::queue_active()), &id)
            .ignore()
            .hdel(self.key(keys::queue_scores()), &id)
            .ignore()
            .zadd(self.key(keys::queue_completed()), &id, now.timestamp_millis())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn reschedule(
        &self,
        job_id: Uuid,
        error: &str,
        run_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let mut job = self.load_active(&mut conn, job_id).await?;
        job.status = JobStatus::Pending;
        job.last_error = Some(error.to_string());
        job.scheduled_at = run_at;
        job.updated_at = now;

        let id = job_id.to_string();
        redis::pipe()
            .atomic()
            .set(self.job_key(job_id), serde_json::to_string(&job)?)
            .ignore()
            .zrem(self.key(keys::queue_active()), &id)
            .ignore()
            .zadd(self.key(keys::queue_delayed()), &id, run_at.timestamp_millis())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn fail(&self, job_id: Uuid, error: &str, now: DateTime<Utc>) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let mut job = self.load_active(&mut conn, job_id).await?;
        job.status = JobStatus::Failed;
        job.last_error = Some(error.to_string());
        job.updated_at = now;
        job.finished_at = Some(now);

        let id = job_id.to_string();
        redis::pipe()
            .atomic()
            .set(self.job_key(job_id), serde_json::to_string(&job)?)
            .ignore()
            .zrem(self.key(keys::queue_active()), &id)
            .ignore()
            .zadd(self.key(keys::queue_failed()), &id, now.timestamp_millis())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn recover_stalled(
        &self,
        claimed_before: DateTime<Utc>,
        error: &str,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let active = self.key(keys::queue_active());
        let stale: Vec<String> = conn
            .zrangebyscore(&active, "-inf", claimed_before.timestamp_millis())
            .await
            .map_err(map_redis_err)?;

        let mut moved = 0;
        for raw_id in stale {
            // Whoever removes the id from `active` owns the recovery.
            let removed: u64 = conn.zrem(&active, &raw_id).await.map_err(map_redis_err)?;
            if removed == 0 {
                continue;
            }
            let Ok(job_id) = Uuid::parse_str(&raw_id) else {
                continue;
            };
            let Some(mut job) = self.load(&mut conn, job_id).await? else {
                continue;
            };
            if matches!(job.status, JobStatus::Completed | JobStatus::Failed) {
                continue;
            }

            job.last_error = Some(error.to_string());
            job.updated_at = now;
            let mut pipe = redis::pipe();
            pipe.atomic();
            if job.has_attempts_left() {
                let stored: Option<f64> = conn
                    .hget(self.key(keys::queue_scores()), &raw_id)
                    .await
                    .map_err(map_redis_err)?;
                let score = match stored {
                    Some(score) => score,
                    None => self.next_score(&mut conn, job.priority).await?,
                };
                job.status = JobStatus::Pending;
                job.scheduled_at = now;
                pipe.zadd(self.key(keys::queue_pending()), &raw_id, score).ignore();
            } else {
                job.status = JobStatus::Failed;
                job.finished_at = Some(now);
                pipe.zadd(self.key(keys::queue_failed()), &raw_id, now.timestamp_millis())
                    .ignore();
            }
            pipe.set(self.job_key(job_id), serde_json::to_string(&job)?)
                .ignore()
                .query_async::<()>(&mut conn)
                .await
                .map_err(map_redis_err)?;

            warn!(job_id = %job_id, attempts = job.attempts, status = %job.status, "Stalled job released");
            moved += 1;
        }
        Ok(moved)
    }

    async fn get(&self, job_id: Uuid) -> AppResult<Option<NotificationJob>> {
        let mut conn = self.client.conn_mut();
        self.load(&mut conn, job_id).await
    }

    async fn list_failed(&self, offset: usize, limit: usize) -> AppResult<Vec<NotificationJob>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.conn_mut();
        let start = offset as isize;
        let stop = (offset + limit - 1) as isize;
        let ids: Vec<String> = conn
            .zrevrange(self.key(keys::queue_failed()), start, stop)
            .await
            .map_err(map_redis_err)?;

        let mut jobs = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let Ok(job_id) = Uuid::parse_str(&raw_id) else {
                continue;
            };
            if let Some(job) = self.load(&mut conn, job_id).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    async fn retry_failed(&self, job_ids: Option<&[Uuid]>, now: DateTime<Utc>) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let candidates: Vec<Uuid> = match job_ids {
            Some(ids) => ids.to_vec(),
            None => {
                let raw: Vec<String> = conn
                    .zrange(self.key(keys::queue_failed()), 0, -1)
                    .await
                    .map_err(map_redis_err)?;
                raw.iter().filter_map(|id| Uuid::parse_str(id).ok()).collect()
            }
        };

        let mut moved = 0;
        for job_id in candidates {
            let Some(mut job) = self.load(&mut conn, job_id).await? else {
                continue;
            };
            if job.status != JobStatus::Failed {
                continue;
            }
            job.reset_for_retry(now);

            let id = job_id.to_string();
            let stored: Option<f64> = conn
                .hget(self.key(keys::queue_scores()), &id)
                .await
                .map_err(map_redis_err)?;
            let score = match stored {
                Some(score) => score,
                None => self.next_score(&mut conn, job.priority).await?,
            };

            redis::pipe()
                .atomic()
                .set(self.job_key(job_id), serde_json::to_string(&job)?)
                .ignore()
                .zrem(self.key(keys::queue_failed()), &id)
                .ignore()
                .hset(self.key(keys::queue_scores()), &id, score)
                .ignore()
                .zadd(self.key(keys::queue_pending()), &id, score)
                .ignore()
                .query_async::<()>(&mut conn)
                .await
                .map_err(map_redis_err)?;
            moved += 1;
        }
        Ok(moved)
    }

    async fn remove_completed_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let completed = self.key(keys::queue_completed());
        let ids: Vec<String> = conn
            .zrangebyscore(&completed, "-inf", cutoff.timestamp_millis())
            .await
            .map_err(map_redis_err)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for raw_id in &ids {
            pipe.del(self.key(keys::queue_job(raw_id))).ignore();
            pipe.zrem(&completed, raw_id).ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(ids.len() as u64)
    }

    async fn counts(&self, now: DateTime<Utc>) -> AppResult<QueueCounts> {
        let mut conn = self.client.conn_mut();
        let now_ms = now.timestamp_millis();
        let delayed = self.key(keys::queue_delayed());

        let (pending, due, waiting, active, completed, failed): (u64, u64, u64, u64, u64, u64) =
            redis::pipe()
                .zcard(self.key(keys::queue_pending()))
                .zcount(&delayed, "-inf", now_ms)
                .zcount(&delayed, format!("({now_ms}"), "+inf")
                .zcard(self.key(keys::queue_active()))
                .zcard(self.key(keys::queue_completed()))
                .zcard(self.key(keys::queue_failed()))
                .query_async(&mut conn)
                .await
                .map_err(map_redis_err)?;

        Ok(QueueCounts {
            pending: pending + due,
            delayed: waiting,
            active,
            completed,
            failed,
        })
    }
}
