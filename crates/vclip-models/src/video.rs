//! Video entity: the record that drives the transcoding, warm-cache and
//! gallery lifecycles.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, VideoCode, VideoId};

/// Video lifecycle status.
///
/// Transition graph (§4.C): `pending -> queued -> processing -> ready`;
/// `processing -> failed` on worker error; `failed -> pending` on retry;
/// `failed -> dead_letter` once the retry ceiling is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Pending,
    Queued,
    Processing,
    Ready,
    Failed,
    DeadLetter,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Queued => "queued",
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
            VideoStatus::DeadLetter => "dead_letter",
        }
    }

    /// True for statuses in the "processing family" referenced by §4.A/§4.H
    /// (`get_stuck_processing`, the processing-timeout detector).
    pub fn is_processing_family(&self) -> bool {
        matches!(self, VideoStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::DeadLetter)
    }

    /// Enforces the transition graph from Invariant 1 (§3).
    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        use VideoStatus::*;
        matches!(
            (*self, next),
            (Pending, Queued)
                | (Queued, Processing)
                | (Processing, Ready)
                | (Processing, Failed)
                | (Pending, Failed) // pending-timeout detector (§4.H)
                | (Failed, Pending)
                | (Failed, DeadLetter)
                | (Queued, Failed) // publish-time rollback or detector edge case
        )
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Warm-cache lifecycle (§4.G), independent of [`VideoStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    #[default]
    Pending,
    Warming,
    Cached,
    Failed,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Pending => "pending",
            CacheStatus::Warming => "warming",
            CacheStatus::Cached => "cached",
            CacheStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gallery lifecycle (§4.F), independent of [`VideoStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GalleryStatus {
    #[default]
    None,
    Processing,
    PendingReview,
    Ready,
}

impl GalleryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GalleryStatus::None => "none",
            GalleryStatus::Processing => "processing",
            GalleryStatus::PendingReview => "pending_review",
            GalleryStatus::Ready => "ready",
        }
    }
}

impl fmt::Display for GalleryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a Video's `error_history` (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorHistoryEntry {
    pub attempt: u32,
    pub error: String,
    pub worker_id: Option<String>,
    pub stage: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorHistoryEntry {
    pub fn new(attempt: u32, error: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            attempt,
            error: error.into(),
            worker_id: None,
            stage: stage.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }
}

/// Quality ladder rung, e.g. "1080p".
pub type Quality = String;

/// The Video entity (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub id: VideoId,
    pub code: VideoCode,
    pub user_id: String,
    pub category_id: Option<CategoryId>,
    pub title: String,
    pub description: Option<String>,

    /// Blob key of the uploaded source; cleared after successful transcode
    /// if `cleanup_original` is enabled.
    pub original_path: Option<String>,

    pub status: VideoStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub error_history: Vec<ErrorHistoryEntry>,
    pub processing_started_at: Option<DateTime<Utc>>,

    pub hls_path: Option<String>,
    pub hls_path_h264: Option<String>,
    pub audio_path: Option<String>,
    pub detected_language: Option<String>,
    pub duration: Option<f64>,
    pub quality: Option<String>,
    pub quality_sizes: HashMap<String, u64>,
    pub disk_usage: u64,
    pub thumbnail_url: Option<String>,

    pub cache_status: CacheStatus,
    pub cache_percentage: u32,
    pub cache_error: Option<String>,
    pub last_warmed_at: Option<DateTime<Utc>>,

    pub gallery_path: Option<String>,
    pub gallery_status: GalleryStatus,
    pub gallery_source_count: u32,
    pub gallery_count: u32,
    pub gallery_safe_count: u32,
    pub gallery_nsfw_count: u32,
    pub gallery_super_safe_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Create a new Video record in `pending` state, as done by the upload handler.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, original_path: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            code: VideoCode::generate(),
            user_id: user_id.into(),
            category_id: None,
            title: title.into(),
            description: None,
            original_path: Some(original_path.into()),
            status: VideoStatus::Pending,
            retry_count: 0,
            last_error: None,
            error_history: Vec::new(),
            processing_started_at: None,
            hls_path: None,
            hls_path_h264: None,
            audio_path: None,
            detected_language: None,
            duration: None,
            quality: None,
            quality_sizes: HashMap::new(),
            disk_usage: 0,
            thumbnail_url: None,
            cache_status: CacheStatus::Pending,
            cache_percentage: 0,
            cache_error: None,
            last_warmed_at: None,
            gallery_path: None,
            gallery_status: GalleryStatus::None,
            gallery_source_count: 0,
            gallery_count: 0,
            gallery_safe_count: 0,
            gallery_nsfw_count: 0,
            gallery_super_safe_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Best available HLS quality, preference order per §4.F.
    pub fn best_gallery_quality(&self) -> Option<&str> {
        const PREFERENCE: [&str; 4] = ["1080p", "720p", "480p", "360p"];
        for q in PREFERENCE {
            if self.quality_sizes.contains_key(q) {
                return Some(q);
            }
        }
        self.quality.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_graph_allows_happy_path() {
        assert!(VideoStatus::Pending.can_transition_to(VideoStatus::Queued));
        assert!(VideoStatus::Queued.can_transition_to(VideoStatus::Processing));
        assert!(VideoStatus::Processing.can_transition_to(VideoStatus::Ready));
    }

    #[test]
    fn transition_graph_rejects_illegal_jumps() {
        assert!(!VideoStatus::Pending.can_transition_to(VideoStatus::Ready));
        assert!(!VideoStatus::Ready.can_transition_to(VideoStatus::Processing));
        assert!(!VideoStatus::DeadLetter.can_transition_to(VideoStatus::Pending));
    }

    #[test]
    fn gallery_quality_preference_order() {
        let mut v = Video::new("u1", "t", "videos/x/original.mp4");
        v.quality_sizes.insert("480p".into(), 100);
        v.quality_sizes.insert("1080p".into(), 900);
        assert_eq!(v.best_gallery_quality(), Some("1080p"));
    }
}
