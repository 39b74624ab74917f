//! Notification worker configuration.

use serde::{Deserialize, Serialize};

/// Notification job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker pool runs inside the backend process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job slots.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Delay between polls when the queue is empty, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Attempts before a job is parked in the failed set.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First retry delay in milliseconds; doubles per attempt.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Upper bound on the retry delay in milliseconds.
    #[serde(default = "default_backoff_cap")]
    pub backoff_cap_ms: u64,
    /// How long notification settings are cached, in seconds.
    #[serde(default = "default_settings_ttl")]
    pub settings_cache_ttl_seconds: u64,
    /// Seconds to wait for in-flight jobs on shutdown.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
    /// Completed jobs older than this are swept by the runner. Zero disables the sweep.
    #[serde(default = "default_completed_retention")]
    pub completed_retention_seconds: u64,
    /// Seconds a claimed job may stay active before it is assumed abandoned
    /// and handed out again.
    #[serde(default = "default_job_lease")]
    pub job_lease_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_cap_ms: default_backoff_cap(),
            settings_cache_ttl_seconds: default_settings_ttl(),
            drain_timeout_seconds: default_drain_timeout(),
            completed_retention_seconds: default_completed_retention(),
            job_lease_seconds: default_job_lease(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    5
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base() -> u64 {
    2_000
}

fn default_backoff_cap() -> u64 {
    60_000
}

fn default_settings_ttl() -> u64 {
    60
}

fn default_drain_timeout() -> u64 {
    30
}

fn default_completed_retention() -> u64 {
    86_400
}

fn default_job_lease() -> u64 {
    300
}
