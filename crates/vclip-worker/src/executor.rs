//! Job executor: one consumption loop per subject, generic over whatever
//! [`JobHandler`] is registered for it. Retry/DLQ bookkeeping lives here,
//! not in the handler — a handler only decides whether a job succeeded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vclip_queue::{JobBus, JobMessage, Subject};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::handler::HandlerRegistry;

pub struct JobExecutor {
    config: WorkerConfig,
    bus: Arc<JobBus>,
    registry: Arc<HandlerRegistry>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, bus: JobBus, registry: HandlerRegistry) -> WorkerResult<Self> {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Ok(Self {
            config,
            bus: Arc::new(bus),
            registry: Arc::new(registry),
            job_semaphore,
            shutdown,
            consumer_name,
        })
    }

    pub async fn run(&self) -> WorkerResult<()> {
        info!("Starting job executor '{}' for subjects {:?}", self.consumer_name, self.registry.subjects());

        self.bus.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        let mut claim_tasks = Vec::new();
        for subject in self.registry.subjects() {
            claim_tasks.push(self.spawn_claim_task(subject, self.shutdown.subscribe()));
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_round() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        for task in claim_tasks {
            task.abort();
        }

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// One round of `consume` across every registered subject.
    async fn consume_round(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        for subject in self.registry.subjects() {
            let jobs = self
                .bus
                .consume(subject, &self.consumer_name, self.config.poll_block.as_millis() as u64, available.min(5))
                .await?;

            if jobs.is_empty() {
                continue;
            }
            debug!(%subject, count = jobs.len(), "consumed jobs");

            for (message_id, job) in jobs {
                let Some(handler) = self.registry.get(subject) else { continue };
                let bus = Arc::clone(&self.bus);
                let permit = self.job_semaphore.clone().acquire_owned().await.map_err(|_| crate::error::WorkerError::job_failed("semaphore closed"))?;

                tokio::spawn(async move {
                    let _permit = permit;
                    Self::execute_job(bus, subject, message_id, job, handler).await;
                });
            }
        }

        Ok(())
    }

    fn spawn_claim_task(&self, subject: Subject, mut shutdown_rx: tokio::sync::watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        let bus = Arc::clone(&self.bus);
        let registry = Arc::clone(&self.registry);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let interval_dur = self.config.claim_interval;
        let min_idle_ms = self.config.claim_min_idle.as_millis() as u64;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_dur);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match bus.claim_pending(subject, &consumer_name, min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!(%subject, count = jobs.len(), "claimed pending jobs");
                                for (message_id, job) in jobs {
                                    let Some(handler) = registry.get(subject) else { continue };
                                    let bus = Arc::clone(&bus);
                                    let Ok(permit) = semaphore.clone().acquire_owned().await else { break };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(bus, subject, message_id, job, handler).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!(%subject, error = %e, "failed to claim pending jobs"),
                        }
                    }
                }
            }
        })
    }

    /// Execute a single job with retry and DLQ handling, generic across
    /// whatever handler the subject's registry entry provides.
    async fn execute_job(bus: Arc<JobBus>, subject: Subject, message_id: String, job: JobMessage, handler: Arc<dyn crate::handler::JobHandler>) {
        let idempotency_key = job.default_idempotency_key();
        info!(%subject, key = %idempotency_key, "executing job");

        let result = handler.handle(job.clone()).await;

        match result {
            Ok(()) => {
                info!(%subject, key = %idempotency_key, "job completed");
                if let Err(e) = bus.ack(subject, &message_id).await {
                    error!(%subject, error = %e, "failed to ack job");
                }
                if let Err(e) = bus.clear_dedup(subject, &idempotency_key).await {
                    warn!(%subject, error = %e, "failed to clear dedup key");
                }
            }
            Err(e) => {
                error!(%subject, key = %idempotency_key, error = %e, "job failed");

                let retry_count = bus.increment_retry(subject, &idempotency_key).await.unwrap_or(u32::MAX);
                let max_retries = bus.max_retries();

                if exceeds_retry_ceiling(retry_count, max_retries) {
                    warn!(%subject, key = %idempotency_key, max_retries, "exceeded max retries, moving to DLQ");
                    if let Err(dlq_err) = bus.dlq(subject, &message_id, &job, &e.to_string()).await {
                        error!(%subject, error = %dlq_err, "failed to move job to DLQ");
                    }
                    if let Err(e) = bus.clear_dedup(subject, &idempotency_key).await {
                        warn!(%subject, error = %e, "failed to clear dedup key");
                    }
                } else {
                    info!(%subject, key = %idempotency_key, retry_count, max_retries, "job will be retried");
                    // Redelivered after the bus's configured visibility timeout.
                }
            }
        }
    }

    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// A failed job is moved to the DLQ once its retry count has reached the
/// bus's configured ceiling, rather than being left for redelivery.
fn exceeds_retry_ceiling(retry_count: u32, max_retries: u32) -> bool {
    retry_count >= max_retries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_below_ceiling_are_redelivered() {
        assert!(!exceeds_retry_ceiling(0, 3));
        assert!(!exceeds_retry_ceiling(2, 3));
    }

    #[test]
    fn retries_at_or_above_ceiling_go_to_dlq() {
        assert!(exceeds_retry_ceiling(3, 3));
        assert!(exceeds_retry_ceiling(4, 3));
    }
}
