//! Reel entity (§3, §4.E): a short video composed from segments of a source
//! Video.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ReelId, VideoId};

/// Maximum total duration of a reel's segments, in seconds (§3, Invariant 9).
pub const MAX_REEL_DURATION_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReelStatus {
    #[default]
    Draft,
    Exporting,
    Ready,
    Failed,
}

impl ReelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReelStatus::Draft => "draft",
            ReelStatus::Exporting => "exporting",
            ReelStatus::Ready => "ready",
            ReelStatus::Failed => "failed",
        }
    }

    /// §3 Invariant 5: update and delete are refused while exporting.
    pub fn blocks_mutation(&self) -> bool {
        matches!(self, ReelStatus::Exporting)
    }
}

impl fmt::Display for ReelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A segment of the source video, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

/// One layer in the legacy layer-based composition mode.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Text { content: String, x: f64, y: f64 },
    Logo { x: f64, y: f64, scale: f64 },
    Image { path: String, x: f64, y: f64, scale: f64 },
}

#[derive(Debug, Error)]
pub enum ReelValidationError {
    #[error("segment {index}: end ({end}) must be greater than start ({start})")]
    NonPositiveDuration { index: usize, start: f64, end: f64 },
    #[error("segment {index}: end ({end}) exceeds source video duration ({video_duration})")]
    ExceedsVideoDuration { index: usize, end: f64, video_duration: f64 },
    #[error("segments sum to {total}s, exceeding the {max}s limit")]
    TotalDurationExceeded { total: f64, max: f64 },
    #[error("a reel must have at least one segment")]
    NoSegments,
}

/// Validate segments against §4.E's rules. `video_duration` is the owning
/// Video's total duration.
pub fn validate_segments(segments: &[Segment], video_duration: f64) -> Result<(), ReelValidationError> {
    if segments.is_empty() {
        return Err(ReelValidationError::NoSegments);
    }

    let mut total = 0.0;
    for (index, seg) in segments.iter().enumerate() {
        if seg.end <= seg.start {
            return Err(ReelValidationError::NonPositiveDuration {
                index,
                start: seg.start,
                end: seg.end,
            });
        }
        if seg.end > video_duration {
            return Err(ReelValidationError::ExceedsVideoDuration {
                index,
                end: seg.end,
                video_duration,
            });
        }
        total += seg.end - seg.start;
    }

    if total > MAX_REEL_DURATION_SECS {
        return Err(ReelValidationError::TotalDurationExceeded {
            total,
            max: MAX_REEL_DURATION_SECS,
        });
    }

    Ok(())
}

/// Style-based composition fields, present only when `style` is set (§4.E).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct StyleComposition {
    pub style: String,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub show_logo: bool,
    pub crop_x: Option<f64>,
    pub crop_y: Option<f64>,
    pub tts_text: Option<String>,
    pub tts_voice: Option<String>,
}

/// Legacy layer-based composition fields, present when `style` is absent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct LayerComposition {
    pub output_format: Option<String>,
    pub video_fit: Option<String>,
    pub layers: Vec<Layer>,
    pub template_id: Option<String>,
}

/// Either composition mode a Reel carries, mutually exclusive per §4.E.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Composition {
    Style(StyleComposition),
    Layers(LayerComposition),
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Reel {
    pub id: ReelId,
    pub video_id: VideoId,
    pub user_id: String,
    pub title: String,
    pub segments: Vec<Segment>,
    pub cover_time: Option<f64>,
    pub composition: Composition,
    pub status: ReelStatus,
    pub export_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reel {
    pub fn new(
        video_id: VideoId,
        user_id: impl Into<String>,
        title: impl Into<String>,
        segments: Vec<Segment>,
        composition: Composition,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReelId::new(),
            video_id,
            user_id: user_id.into(),
            title: title.into(),
            segments,
            cover_time: None,
            composition,
            status: ReelStatus::Draft,
            export_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives the legacy single-segment view (§9 design note): the first
    /// segment's bounds, for callers that still expect `segment_start`/`segment_end`.
    pub fn legacy_segment_bounds(&self) -> Option<(f64, f64)> {
        self.segments.first().map(|s| (s.start, s.end))
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.end - s.start).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_or_negative_duration_segment() {
        let segs = vec![Segment { start: 10.0, end: 10.0 }];
        assert!(matches!(
            validate_segments(&segs, 100.0),
            Err(ReelValidationError::NonPositiveDuration { .. })
        ));
    }

    #[test]
    fn rejects_segment_past_video_duration() {
        let segs = vec![Segment { start: 0.0, end: 50.0 }];
        assert!(matches!(
            validate_segments(&segs, 30.0),
            Err(ReelValidationError::ExceedsVideoDuration { .. })
        ));
    }

    #[test]
    fn rejects_total_over_sixty_seconds() {
        let segs = vec![
            Segment { start: 0.0, end: 40.0 },
            Segment { start: 40.0, end: 70.0 },
        ];
        assert!(matches!(
            validate_segments(&segs, 100.0),
            Err(ReelValidationError::TotalDurationExceeded { .. })
        ));
    }

    #[test]
    fn accepts_valid_segments() {
        let segs = vec![
            Segment { start: 0.0, end: 20.0 },
            Segment { start: 30.0, end: 50.0 },
        ];
        assert!(validate_segments(&segs, 100.0).is_ok());
    }

    #[test]
    fn exporting_blocks_mutation() {
        assert!(ReelStatus::Exporting.blocks_mutation());
        assert!(!ReelStatus::Draft.blocks_mutation());
        assert!(!ReelStatus::Ready.blocks_mutation());
    }
}
