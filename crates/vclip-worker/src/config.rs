//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum jobs processed concurrently across all subjects.
    pub max_concurrent_jobs: usize,
    /// Graceful shutdown timeout.
    pub shutdown_timeout: Duration,
    /// How often the worker scans each subject for orphaned pending jobs.
    pub claim_interval: Duration,
    /// Minimum idle time before a pending message can be claimed (crash recovery).
    pub claim_min_idle: Duration,
    /// Blocking read timeout per `XREADGROUP` poll.
    pub poll_block: Duration,
    /// Base URL of the `vclip-api` worker-callback surface.
    pub callback_base_url: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(60),
            claim_min_idle: Duration::from_secs(1800),
            poll_block: Duration::from_secs(1),
            callback_base_url: "http://localhost:8080/api/callbacks".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_concurrent_jobs),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.shutdown_timeout.as_secs()),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.claim_interval.as_secs()),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.claim_min_idle.as_secs()),
            ),
            poll_block: Duration::from_millis(
                std::env::var("WORKER_POLL_BLOCK_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default.poll_block.as_millis() as u64),
            ),
            callback_base_url: std::env::var("WORKER_CALLBACK_BASE_URL").unwrap_or(default.callback_base_url),
        }
    }
}
