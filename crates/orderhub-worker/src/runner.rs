//! Worker runner: main loop that claims jobs and executes them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use orderhub_core::config::WorkerConfig;
use orderhub_entity::job::NotificationJob;

use crate::executor::JobExecutor;
use crate::queue::{FailureOutcome, JobQueue};

/// How often the runner releases stalled claims and sweeps old completed jobs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Main worker runner that polls the queue and executes jobs
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job queue for polling
    queue: Arc<JobQueue>,
    /// Job executor for dispatching
    executor: Arc<JobExecutor>,
    /// Worker configuration
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor>, config: WorkerConfig) -> Self {
        Self {
            queue,
            executor,
            config,
        }
    }

    /// Start the worker runner. Runs until the cancel signal is received,
    /// then waits (bounded) for in-flight jobs.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        info!(
            concurrency,
            poll_interval_ms = self.config.poll_interval_ms,
            max_attempts = self.queue.policy().max_attempts,
            "Notification worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        self.sweep().await;
        let mut last_sweep = Instant::now();

        loop {
            if last_sweep.elapsed() >= SWEEP_INTERVAL {
                last_sweep = Instant::now();
                self.sweep().await;
            }

            let permit = tokio::select! {
                _ = shutdown_requested(&mut cancel) => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            match self.queue.claim().await {
                Ok(Some(job)) => {
                    let queue = Arc::clone(&self.queue);
                    let executor = Arc::clone(&self.executor);
                    tokio::spawn(async move {
                        let _permit = permit;
                        process_job(&queue, &executor, job).await;
                    });
                    continue;
                }
                Ok(None) => drop(permit),
                Err(e) => {
                    drop(permit);
                    error!(error = %e, "Failed to claim job");
                }
            }

            tokio::select! {
                _ = shutdown_requested(&mut cancel) => break,
                _ = time::sleep(poll_interval) => {}
            }
        }

        info!("Notification worker waiting for in-flight jobs to complete");
        let drain = Duration::from_secs(self.config.drain_timeout_seconds);
        let permits = u32::try_from(concurrency).unwrap_or(u32::MAX);
        if time::timeout(drain, semaphore.acquire_many(permits)).await.is_err() {
            warn!("Drain timeout elapsed with jobs still in flight");
        }

        info!("Notification worker shut down");
    }

    /// Claim and process a single job inline. Returns whether a job was processed.
    pub async fn run_once(&self) -> orderhub_core::AppResult<bool> {
        match self.queue.claim().await? {
            Some(job) => {
                process_job(&self.queue, &self.executor, job).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sweep(&self) {
        let lease = Duration::from_secs(self.config.job_lease_seconds);
        if let Err(e) = self.queue.recover_stalled(lease).await {
            warn!(error = %e, "Stalled job recovery failed");
        }
        if self.config.completed_retention_seconds == 0 {
            return;
        }
        let retention = Duration::from_secs(self.config.completed_retention_seconds);
        if let Err(e) = self.queue.clean(retention).await {
            warn!(error = %e, "Completed job sweep failed");
        }
    }
}

/// Execute one claimed job and record its outcome.
async fn process_job(queue: &JobQueue, executor: &JobExecutor, job: NotificationJob) {
    let job_id = job.id;

    match executor.execute(&job).await {
        Ok(result) => {
            if let Err(e) = queue.complete(job_id, result).await {
                error!(job_id = %job_id, error = %e, "Failed to mark job as completed");
            } else {
                info!(job_id = %job_id, attempt = job.attempts, "Job completed successfully");
            }
        }
        Err(err) => {
            let message = err.to_string();
            warn!(
                job_id = %job_id,
                attempt = job.attempts,
                retryable = err.is_retryable(),
                error = %message,
                "Job attempt failed"
            );
            match queue.record_failure(&job, &message, err.is_retryable()).await {
                Ok(FailureOutcome::Retrying { delay }) => {
                    debug!(job_id = %job_id, delay_ms = delay.as_millis() as u64, "Retry scheduled");
                }
                Ok(FailureOutcome::Failed) => {}
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Failed to record job failure");
                }
            }
        }
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn shutdown_requested(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}
