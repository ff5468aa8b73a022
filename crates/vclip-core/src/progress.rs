//! Progress reporting convenience wrapper (§4.K): orchestrators report
//! phase/percent updates through this rather than touching `ProgressTracker`
//! directly, so the coalescing and terminal-flush rules stay centralized.

use std::sync::Arc;

use vclip_models::ProgressEvent;
use vclip_queue::{ProgressTracker, QueueResult};

#[derive(Clone)]
pub struct ProgressReporter {
    tracker: Arc<ProgressTracker>,
}

impl ProgressReporter {
    pub fn new(tracker: Arc<ProgressTracker>) -> Self {
        Self { tracker }
    }

    pub async fn report(&self, user_id: &str, entity_id: &str, phase: &str, percent: u8) -> QueueResult<()> {
        self.tracker.record(ProgressEvent::new(user_id, entity_id, phase, percent)).await
    }

    pub async fn report_with_message(&self, user_id: &str, entity_id: &str, phase: &str, percent: u8, message: &str) -> QueueResult<()> {
        self.tracker.record(ProgressEvent::new(user_id, entity_id, phase, percent).with_message(message)).await
    }

    pub async fn complete(&self, user_id: &str, entity_id: &str, phase: &str) -> QueueResult<()> {
        self.tracker.record(ProgressEvent::new(user_id, entity_id, phase, 100).terminal()).await
    }

    pub async fn error(&self, user_id: &str, entity_id: &str, message: &str) -> QueueResult<()> {
        self.tracker
            .record(ProgressEvent::new(user_id, entity_id, "error", 0).with_message(message).terminal())
            .await
    }
}
