//! Job executor: decodes typed payloads and dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use orderhub_core::error::AppError;
use orderhub_entity::job::{JobPayload, JobType, NotificationJob, PayloadError};
use orderhub_telegram::TelegramError;

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Job types this handler processes
    fn job_types(&self) -> &[JobType];

    /// Execute the job with its decoded payload
    async fn execute(
        &self,
        job: &NotificationJob,
        payload: JobPayload,
    ) -> Result<Option<Value>, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, do not retry
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, may retry
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether the queue should schedule another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent(_))
    }
}

impl From<PayloadError> for JobExecutionError {
    fn from(err: PayloadError) -> Self {
        Self::Permanent(err.to_string())
    }
}

// Every Telegram failure is retried, including 4xx; the attempt bound stops
// a permanently rejected chat from looping.
impl From<TelegramError> for JobExecutionError {
    fn from(err: TelegramError) -> Self {
        Self::Transient(err.to_string())
    }
}

/// Dispatches jobs to the appropriate handler based on job_type
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler for every type it declares
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        for job_type in handler.job_types() {
            info!(job_type = %job_type, "Registered job handler");
            self.handlers.insert(*job_type, Arc::clone(&handler));
        }
    }

    /// Decode the payload and execute the job with the matching handler.
    ///
    /// Unknown types and malformed payloads fail permanently.
    pub async fn execute(&self, job: &NotificationJob) -> Result<Option<Value>, JobExecutionError> {
        let payload = JobPayload::parse(&job.job_type, &job.data)?;
        let job_type = payload.job_type();

        let handler = self.handlers.get(&job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!(
                "No handler registered for job type '{job_type}'"
            ))
        })?;

        info!(
            job_id = %job.id,
            job_type = %job_type,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            "Executing job"
        );

        handler.execute(job, payload).await
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: JobType) -> bool {
        self.handlers.contains_key(&job_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderhub_entity::job::{JobPriority, NewNotificationJob};
    use serde_json::json;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl JobHandler for Echo {
        fn job_types(&self) -> &[JobType] {
            &[JobType::Custom]
        }

        async fn execute(
            &self,
            _job: &NotificationJob,
            payload: JobPayload,
        ) -> Result<Option<Value>, JobExecutionError> {
            match payload {
                JobPayload::Custom(msg) => Ok(Some(json!({ "text": msg.text }))),
                _ => Err(JobExecutionError::Permanent("unexpected payload".into())),
            }
        }
    }

    fn job(job_type: &str, data: Value) -> NotificationJob {
        NotificationJob::from_new(
            NewNotificationJob::new(job_type, JobPriority::Normal, data),
            3,
            Utc::now(),
        )
    }

    fn executor() -> JobExecutor {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(Echo));
        executor
    }

    #[tokio::test]
    async fn test_dispatches_decoded_payload() {
        let result = executor()
            .execute(&job("custom", json!({"chat_id": 1, "text": "hello"})))
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"text": "hello"})));
    }

    #[tokio::test]
    async fn test_unknown_type_is_permanent() {
        let err = executor()
            .execute(&job("fax", json!({})))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_payload_is_permanent() {
        let err = executor()
            .execute(&job("custom", json!({"text": "no chat"})))
            .await
            .unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }

    #[tokio::test]
    async fn test_missing_handler_is_permanent() {
        let err = executor()
            .execute(&job("broadcast", json!({"chat_id": 1, "text": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(msg) if msg.contains("broadcast")));
    }

    #[test]
    fn test_transient_and_internal_retry() {
        assert!(JobExecutionError::Transient("x".into()).is_retryable());
        assert!(JobExecutionError::Internal(AppError::internal("x")).is_retryable());
    }
}
