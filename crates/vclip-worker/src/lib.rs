//! Job consumer harness for the five worker-side job families.
//!
//! This crate owns consumption, crash-recovery claiming, and retry/DLQ
//! bookkeeping against the job bus. It holds no transcoding, transcription,
//! translation, compositing, or frame-classification logic of its own —
//! that lives behind the [`handler::JobHandler`] seam, which a real worker
//! deployment implements per subject. The implementations in `handlers.rs`
//! are stubs that report success back to `vclip-api` without doing the
//! underlying work.

pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod handler;
pub mod handlers;

pub use callback::CallbackClient;
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use handler::{HandlerRegistry, JobHandler};
pub use handlers::StubHandler;
