//! Subtitle entity (§3, §4.D).

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{SubtitleId, VideoId};

/// Sentinel language tag used before detection has run.
pub const AUTO_LANGUAGE: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleType {
    #[default]
    Original,
    Translated,
}

impl fmt::Display for SubtitleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubtitleType::Original => "original",
            SubtitleType::Translated => "translated",
        };
        write!(f, "{s}")
    }
}

/// Subtitle lifecycle: `queued -> {detecting|processing|translating} -> ready`;
/// any in-progress state can fail to `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleStatus {
    #[default]
    Queued,
    Detecting,
    Processing,
    Translating,
    Ready,
    Failed,
}

impl SubtitleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleStatus::Queued => "queued",
            SubtitleStatus::Detecting => "detecting",
            SubtitleStatus::Processing => "processing",
            SubtitleStatus::Translating => "translating",
            SubtitleStatus::Ready => "ready",
            SubtitleStatus::Failed => "failed",
        }
    }

    /// Statuses counted as "in progress" for duplicate-suppression checks
    /// (§4.D `trigger_transcribe`/`trigger_translate`).
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            SubtitleStatus::Queued | SubtitleStatus::Detecting | SubtitleStatus::Processing | SubtitleStatus::Translating
        )
    }

    pub fn is_terminal_success(&self) -> bool {
        matches!(self, SubtitleStatus::Ready)
    }

    /// The status a record enters when its job starts, keyed by job type
    /// (§6 `job_started(entity_id, job_type)`).
    pub fn in_progress_for(job_type: &str) -> Option<SubtitleStatus> {
        match job_type {
            "detect" => Some(SubtitleStatus::Detecting),
            "transcribe" => Some(SubtitleStatus::Processing),
            "translate" => Some(SubtitleStatus::Translating),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: SubtitleStatus) -> bool {
        use SubtitleStatus::*;
        matches!(
            (*self, next),
            (Queued, Detecting)
                | (Queued, Processing)
                | (Queued, Translating)
                | (Detecting, Ready)
                | (Processing, Ready)
                | (Translating, Ready)
                | (Queued, Failed)
                | (Detecting, Failed)
                | (Processing, Failed)
                | (Translating, Failed)
                | (Failed, Queued) // retry_stuck / re-trigger after failure
        )
    }
}

impl fmt::Display for SubtitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Subtitle {
    pub id: SubtitleId,
    pub video_id: VideoId,
    pub language: String,
    pub subtitle_type: SubtitleType,
    pub source_language: Option<String>,
    pub status: SubtitleStatus,
    pub srt_path: Option<String>,
    pub confidence: Option<f64>,
    pub error: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtitle {
    pub fn new_original(video_id: VideoId, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SubtitleId::new(),
            video_id,
            language: language.into(),
            subtitle_type: SubtitleType::Original,
            source_language: None,
            status: SubtitleStatus::Queued,
            srt_path: None,
            confidence: None,
            error: None,
            processing_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_translated(video_id: VideoId, language: impl Into<String>, source_language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SubtitleId::new(),
            video_id,
            language: language.into(),
            subtitle_type: SubtitleType::Translated,
            source_language: Some(source_language.into()),
            status: SubtitleStatus::Queued,
            srt_path: None,
            confidence: None,
            error: None,
            processing_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Allowed auto-translate targets (§4.D, §4.K/S4): `th` sources translate to
/// `en`; anything else translates to `th`. Mirrors the auto-chain in
/// `transcribe_complete`.
pub fn allowed_translate_targets(source_language: &str) -> &'static [&'static str] {
    if source_language == "th" {
        &["en"]
    } else {
        &["th"]
    }
}

/// The single opposite-language auto-chain target fired by `transcribe_complete`.
pub fn auto_chain_target(source_language: &str) -> &'static str {
    allowed_translate_targets(source_language)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn th_source_only_allows_en_target() {
        assert_eq!(allowed_translate_targets("th"), &["en"]);
        assert_eq!(auto_chain_target("th"), "en");
    }

    #[test]
    fn non_th_source_only_allows_th_target() {
        assert_eq!(allowed_translate_targets("en"), &["th"]);
        assert_eq!(allowed_translate_targets("fr"), &["th"]);
        assert_eq!(auto_chain_target("fr"), "th");
    }

    #[test]
    fn queued_only_moves_to_an_in_progress_status_or_failed() {
        assert!(SubtitleStatus::Queued.can_transition_to(SubtitleStatus::Detecting));
        assert!(SubtitleStatus::Queued.can_transition_to(SubtitleStatus::Processing));
        assert!(SubtitleStatus::Queued.can_transition_to(SubtitleStatus::Translating));
        assert!(SubtitleStatus::Queued.can_transition_to(SubtitleStatus::Failed));
        assert!(!SubtitleStatus::Queued.can_transition_to(SubtitleStatus::Ready));
    }

    #[test]
    fn ready_is_terminal() {
        assert!(!SubtitleStatus::Ready.can_transition_to(SubtitleStatus::Failed));
        assert!(!SubtitleStatus::Ready.can_transition_to(SubtitleStatus::Queued));
        assert!(!SubtitleStatus::Ready.can_transition_to(SubtitleStatus::Processing));
    }

    #[test]
    fn in_progress_moves_to_ready_or_failed_only() {
        for status in [SubtitleStatus::Detecting, SubtitleStatus::Processing, SubtitleStatus::Translating] {
            assert!(status.can_transition_to(SubtitleStatus::Ready));
            assert!(status.can_transition_to(SubtitleStatus::Failed));
            assert!(!status.can_transition_to(SubtitleStatus::Queued));
        }
    }
}
