//! Job bus adapter (§4.B) for the video job orchestration plane.
//!
//! This crate provides:
//! - A durable, per-subject Redis Streams bus (`bus`) with dedup, DLQ,
//!   and crashed-consumer claiming
//! - A worker heartbeat registry (`heartbeat`)
//! - The progress tracker transport (`progress`)

pub mod bus;
pub mod error;
pub mod heartbeat;
pub mod job;
pub mod progress;
pub mod subject;

pub use bus::{BusConfig, JobBus};
pub use error::{QueueError, QueueResult};
pub use heartbeat::HeartbeatRegistry;
pub use job::{
    GalleryJob, JobMessage, ReelExportJob, SubtitleDetectJob, SubtitleTranscribeJob, SubtitleTranslateJob, TranscodeJob,
    WarmCacheJob,
};
pub use progress::{ProgressChannel, ProgressTracker};
pub use subject::Subject;
