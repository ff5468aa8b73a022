//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Callback request failed: {0}")]
    Callback(#[from] reqwest::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] vclip_queue::QueueError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }
}
