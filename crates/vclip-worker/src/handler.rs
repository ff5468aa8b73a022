//! The pluggable dispatch seam: one [`JobHandler`] per [`Subject`], chosen
//! by the executor purely from the message envelope. A real deployment
//! swaps the stub implementations in `handlers.rs` for ones that actually
//! transcode/transcribe/translate/export/composite — this crate only owns
//! consumption, retry/DLQ bookkeeping, and callback plumbing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use vclip_queue::{JobMessage, Subject};

use crate::error::WorkerResult;

#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: JobMessage) -> WorkerResult<()>;
}

/// Maps each subject to the handler that processes its jobs.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Subject, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    pub fn register(mut self, subject: Subject, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(subject, handler);
        self
    }

    pub fn get(&self, subject: Subject) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&subject).cloned()
    }

    pub fn subjects(&self) -> Vec<Subject> {
        self.handlers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct NoopHandler;

    #[async_trait]
    impl JobHandler for NoopHandler {
        async fn handle(&self, _job: JobMessage) -> WorkerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn registers_and_looks_up_by_subject() {
        let handler: Arc<dyn JobHandler> = Arc::new(NoopHandler);
        let registry = HandlerRegistry::new().register(Subject::TranscodeJobs, Arc::clone(&handler));

        assert!(registry.get(Subject::TranscodeJobs).is_some());
        assert!(registry.get(Subject::ReelExport).is_none());
        assert_eq!(registry.subjects(), vec![Subject::TranscodeJobs]);
    }
}
