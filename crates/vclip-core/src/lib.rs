//! Job orchestration plane: one orchestrator per entity lifecycle, sharing
//! one job bus, one database, and one blob store, under concurrent worker
//! failure, duplicate delivery, and message loss.
//!
//! Orchestrators are plain values holding injected `Arc<Repo>`/`Arc<JobBus>`/
//! `Arc<SettingsCache>` capabilities — there is no global singleton. Callers
//! (the HTTP edge, the worker harness, the scheduler) construct one instance
//! of each orchestrator at startup and share it behind an `Arc`.

pub mod admin;
pub mod detectors;
pub mod error;
pub mod gallery;
pub mod progress;
pub mod reel;
pub mod settings;
pub mod subtitle;
pub mod transcoding;
pub mod warmcache;

pub use admin::{AdminService, QueueDepth};
pub use detectors::StuckDetectors;
pub use error::{OrchestratorError, OrchestratorResult};
pub use gallery::GalleryOrchestrator;
pub use progress::ProgressReporter;
pub use reel::ReelOrchestrator;
pub use settings::SettingsCache;
pub use subtitle::{SubtitleOrchestrator, TranslateOutcome};
pub use transcoding::TranscodingOrchestrator;
pub use warmcache::WarmCacheOrchestrator;
