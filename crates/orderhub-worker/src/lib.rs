//! Notification delivery pipeline for OrderHub.
//!
//! This crate provides:
//! - A message template renderer with optional-line dropping
//! - A durable job queue over a pluggable store (memory or Redis)
//! - A job executor that checks typed payloads and dispatches to handlers
//! - Telegram delivery handlers for order alerts, custom messages and broadcasts
//! - A worker runner with bounded concurrency and retry with backoff

pub mod executor;
pub mod jobs;
pub mod policy;
pub mod queue;
pub mod runner;
pub mod settings;
pub mod store;
pub mod template;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use policy::RetryPolicy;
pub use queue::{FailureOutcome, JobQueue, QueueStats};
pub use runner::WorkerRunner;
pub use settings::{CachedSettingsSource, SettingsSource, StaticSettingsSource};
pub use store::{JobStore, MemoryJobStore, QueueCounts, RedisJobStore};
