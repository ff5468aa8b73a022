//! Shared data models for the video job orchestration plane.
//!
//! This crate provides serde-serializable domain types for:
//! - Entity identifiers (ids.rs)
//! - Video, Subtitle and Reel lifecycles and their transition graphs
//! - Settings and their audit trail
//! - Worker heartbeat records
//! - The progress-tracker event shape
//!
//! No I/O lives here: repositories, the bus, and the blob store are
//! separate crates that operate on these types.

pub mod error;
pub mod ids;
pub mod progress;
pub mod reel;
pub mod settings;
pub mod subtitle;
pub mod video;
pub mod worker;

pub use error::ModelError;
pub use ids::{CategoryId, JobId, ReelId, SubtitleId, VideoCode, VideoId};
pub use progress::ProgressEvent;
pub use reel::{
    validate_segments, Composition, Layer, LayerComposition, Reel, ReelStatus, ReelValidationError, Segment,
    StyleComposition, MAX_REEL_DURATION_SECS,
};
pub use settings::{mask_if_secret, Setting, SettingKey, SettingValueType, SettingsAuditEntry};
pub use subtitle::{allowed_translate_targets, auto_chain_target, Subtitle, SubtitleStatus, SubtitleType, AUTO_LANGUAGE};
pub use video::{CacheStatus, ErrorHistoryEntry, GalleryStatus, Quality, Video, VideoStatus};
pub use worker::{WorkerHeartbeat, WorkerLifecycleStatus, WorkerType};
