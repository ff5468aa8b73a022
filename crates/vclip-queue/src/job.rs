//! Job message payloads, one per subject (§6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vclip_models::{ReelId, SubtitleId, VideoId};

use crate::subject::Subject;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub video_id: VideoId,
    pub video_code: String,
    pub input_path: String,
    pub output_path: String,
    pub codec: String,
    pub qualities: Vec<String>,
    #[serde(default)]
    pub use_byte_range: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleDetectJob {
    pub video_id: VideoId,
    pub video_code: String,
    pub audio_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTranscribeJob {
    pub subtitle_id: SubtitleId,
    pub video_id: VideoId,
    pub video_code: String,
    pub audio_path: String,
    pub language: String,
    pub output_path: String,
    #[serde(default)]
    pub refine_with_llm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTranslateJob {
    pub subtitle_ids: Vec<SubtitleId>,
    pub video_id: VideoId,
    pub video_code: String,
    pub source_srt_path: String,
    pub source_language: String,
    pub target_languages: Vec<String>,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelExportJob {
    pub reel_id: ReelId,
    pub video_id: VideoId,
    /// Serialized `vclip_models::Composition` (style- or layer-based).
    pub composition: serde_json::Value,
    pub segments: serde_json::Value,
    pub output_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryJob {
    pub video_id: VideoId,
    pub code: String,
    pub hls_path: String,
    pub quality: String,
    pub duration: f64,
    pub output_path: String,
    pub max_frames: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmCacheJob {
    pub video_id: VideoId,
    pub code: String,
    pub hls_prefix: String,
    pub segment_counts: HashMap<String, u32>,
    pub priority: u8,
}

/// The envelope stored on the bus. Each variant carries exactly the payload
/// for one [`Subject`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobMessage {
    Transcode(TranscodeJob),
    SubtitleDetect(SubtitleDetectJob),
    SubtitleTranscribe(SubtitleTranscribeJob),
    SubtitleTranslate(SubtitleTranslateJob),
    ReelExport(ReelExportJob),
    Gallery(GalleryJob),
    WarmCache(WarmCacheJob),
}

impl JobMessage {
    pub fn subject(&self) -> Subject {
        match self {
            JobMessage::Transcode(_) => Subject::TranscodeJobs,
            JobMessage::SubtitleDetect(_) => Subject::SubtitleDetect,
            JobMessage::SubtitleTranscribe(_) => Subject::SubtitleTranscribe,
            JobMessage::SubtitleTranslate(_) => Subject::SubtitleTranslate,
            JobMessage::ReelExport(_) => Subject::ReelExport,
            JobMessage::Gallery(_) => Subject::GalleryJobs,
            JobMessage::WarmCache(_) => Subject::WarmcacheJobs,
        }
    }

    /// Idempotency key defaults to the primary entity id (§4.B).
    pub fn default_idempotency_key(&self) -> String {
        match self {
            JobMessage::Transcode(j) => j.video_id.to_string(),
            JobMessage::SubtitleDetect(j) => j.video_id.to_string(),
            JobMessage::SubtitleTranscribe(j) => j.subtitle_id.to_string(),
            JobMessage::SubtitleTranslate(j) => j
                .subtitle_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(","),
            JobMessage::ReelExport(j) => j.reel_id.to_string(),
            JobMessage::Gallery(j) => j.video_id.to_string(),
            JobMessage::WarmCache(j) => j.video_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcode_job_serde_roundtrip() {
        let job = JobMessage::Transcode(TranscodeJob {
            video_id: VideoId::new(),
            video_code: "abc12345".into(),
            input_path: "videos/abc12345/original.mp4".into(),
            output_path: "videos/abc12345/".into(),
            codec: "h265".into(),
            qualities: vec!["1080p".into(), "720p".into()],
            use_byte_range: false,
        });

        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: JobMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.subject(), job.subject());
        assert_eq!(decoded.default_idempotency_key(), job.default_idempotency_key());
    }

    #[test]
    fn idempotency_key_defaults_to_primary_entity_id() {
        let video_id = VideoId::new();
        let job = JobMessage::Transcode(TranscodeJob {
            video_id: video_id.clone(),
            video_code: "x".into(),
            input_path: "x".into(),
            output_path: "x".into(),
            codec: "h264".into(),
            qualities: vec![],
            use_byte_range: false,
        });
        assert_eq!(job.default_idempotency_key(), video_id.to_string());
    }
}
