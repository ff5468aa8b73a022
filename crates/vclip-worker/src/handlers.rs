//! Stub job handlers: one per subject. Each reports a job-started callback,
//! then immediately reports completion with placeholder output paths. A
//! real worker implementation replaces these with actual transcoding,
//! transcription, translation, compositing, and frame-extraction logic —
//! none of which is in scope here.

use async_trait::async_trait;
use serde_json::json;

use vclip_queue::JobMessage;

use crate::callback::CallbackClient;
use crate::error::WorkerResult;
use crate::handler::JobHandler;

pub struct StubHandler {
    callbacks: CallbackClient,
}

impl StubHandler {
    pub fn new(callbacks: CallbackClient) -> Self {
        Self { callbacks }
    }
}

#[async_trait]
impl JobHandler for StubHandler {
    async fn handle(&self, job: JobMessage) -> WorkerResult<()> {
        match job {
            JobMessage::Transcode(j) => {
                self.callbacks.post("transcode/started", &json!({ "video_id": j.video_id })).await;
                self.callbacks
                    .post(
                        "transcode/complete",
                        &json!({
                            "video_id": j.video_id,
                            "hls_path": format!("{}master.m3u8", j.output_path),
                            "hls_path_h264": null::<()>,
                            "duration": 0.0,
                            "quality": j.qualities.first().cloned().unwrap_or_else(|| "720p".to_string()),
                            "disk_usage": 0,
                            "quality_sizes": {},
                            "thumbnail_url": null::<()>,
                        }),
                    )
                    .await;
            }
            JobMessage::SubtitleDetect(j) => {
                self.callbacks.post("subtitles/detect-complete", &json!({ "video_id": j.video_id, "language": "en" })).await;
            }
            JobMessage::SubtitleTranscribe(j) => {
                self.callbacks
                    .post("subtitles/started", &json!({ "subtitle_id": j.subtitle_id, "job_type": "transcribe" }))
                    .await;
                self.callbacks
                    .post(
                        "subtitles/transcribe-complete",
                        &json!({ "subtitle_id": j.subtitle_id, "srt_path": format!("{}original.srt", j.output_path), "language": j.language }),
                    )
                    .await;
            }
            JobMessage::SubtitleTranslate(j) => {
                for (subtitle_id, target) in j.subtitle_ids.iter().zip(j.target_languages.iter()) {
                    self.callbacks
                        .post("subtitles/started", &json!({ "subtitle_id": subtitle_id, "job_type": "translate" }))
                        .await;
                    self.callbacks
                        .post(
                            "subtitles/translate-complete",
                            &json!({ "subtitle_id": subtitle_id, "srt_path": format!("{}{}.srt", j.output_path, target), "language": target }),
                        )
                        .await;
                }
            }
            JobMessage::ReelExport(j) => {
                self.callbacks.post("reels/export-complete", &json!({ "reel_id": j.reel_id })).await;
            }
            JobMessage::Gallery(j) => {
                self.callbacks
                    .post(
                        "gallery/update",
                        &json!({
                            "video_id": j.video_id,
                            "gallery_path": j.output_path,
                            "source_count": 0,
                            "count": 0,
                            "safe_count": 0,
                            "nsfw_count": 0,
                            "super_safe_count": 0,
                        }),
                    )
                    .await;
            }
            JobMessage::WarmCache(j) => {
                self.callbacks.post("warmcache/complete", &json!({ "video_id": j.video_id })).await;
            }
        }

        Ok(())
    }
}
