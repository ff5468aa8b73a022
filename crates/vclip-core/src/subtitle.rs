//! Subtitle orchestrator (§4.D): per-(video, language) record creation,
//! auto-translate chaining, stuck-record retry, duplicate suppression.

use std::sync::Arc;

use tracing::{error, info, warn};
use vclip_db::{SubtitleRepo, VideoRepo};
use vclip_models::{
    allowed_translate_targets, auto_chain_target, Subtitle, SubtitleId, SubtitleStatus, SubtitleType, VideoId, AUTO_LANGUAGE,
};
use vclip_queue::{JobBus, JobMessage, SubtitleDetectJob, SubtitleTranscribeJob, SubtitleTranslateJob};

use crate::error::{OrchestratorError, OrchestratorResult};

pub struct SubtitleOrchestrator {
    subtitles: Arc<SubtitleRepo>,
    videos: Arc<VideoRepo>,
    bus: Arc<JobBus>,
}

/// Outcome of a translate request: some targets may be invalid or skipped.
pub struct TranslateOutcome {
    pub created: Vec<SubtitleId>,
    pub invalid_targets: Vec<String>,
    pub skipped_targets: Vec<String>,
}

impl SubtitleOrchestrator {
    pub fn new(subtitles: Arc<SubtitleRepo>, videos: Arc<VideoRepo>, bus: Arc<JobBus>) -> Self {
        Self { subtitles, videos, bus }
    }

    /// `trigger_detect(video_id)`: requires `ready` video with `audio_path`
    /// set and `detected_language` empty.
    pub async fn trigger_detect(&self, video_id: &VideoId) -> OrchestratorResult<()> {
        let video = self.videos.get_by_id(video_id).await?;

        if video.status != vclip_models::VideoStatus::Ready {
            return Err(OrchestratorError::invalid_state(video.status.as_str(), "ready"));
        }
        let audio_path = video.audio_path.clone().ok_or_else(|| OrchestratorError::validation("video has no audio_path"))?;
        if video.detected_language.is_some() {
            return Err(OrchestratorError::conflict("language already detected"));
        }

        let job = JobMessage::SubtitleDetect(SubtitleDetectJob {
            video_id: video.id.clone(),
            video_code: video.code.as_str().to_string(),
            audio_path,
        });
        self.bus.publish_default(&job).await?;
        Ok(())
    }

    /// `trigger_transcribe(video_id)` (§4.D).
    pub async fn trigger_transcribe(&self, video_id: &VideoId) -> OrchestratorResult<Subtitle> {
        let video = self.videos.get_by_id(video_id).await?;
        let audio_path = video.audio_path.clone().ok_or_else(|| OrchestratorError::validation("video has no audio_path"))?;

        if let Some(existing) = self.subtitles.find_active_original(video_id).await? {
            if existing.status.is_terminal_success() || existing.status.is_in_progress() {
                return Err(OrchestratorError::conflict("original subtitle already ready or in progress"));
            }
        }
        // `failed` originals (not returned by `find_active_original`) are
        // cleaned up unconditionally before creating a new record.
        for s in self.subtitles.list_by_video(video_id).await? {
            if s.subtitle_type == SubtitleType::Original && s.status == SubtitleStatus::Failed {
                self.subtitles.delete(&s.id).await?;
            }
        }

        let language = video.detected_language.clone().unwrap_or_else(|| AUTO_LANGUAGE.to_string());
        let subtitle = Subtitle::new_original(video_id.clone(), language.clone());
        self.subtitles.insert(&subtitle).await?;

        let job = JobMessage::SubtitleTranscribe(SubtitleTranscribeJob {
            subtitle_id: subtitle.id.clone(),
            video_id: video.id.clone(),
            video_code: video.code.as_str().to_string(),
            audio_path,
            language,
            output_path: format!("subtitles/{}/", video.code.as_str()),
            refine_with_llm: false,
        });

        if let Err(e) = self.bus.publish_default(&job).await {
            // Roll back the tentative record on publish failure (§4.D, §7).
            self.subtitles.delete(&subtitle.id).await.ok();
            return Err(OrchestratorError::from(e));
        }

        Ok(subtitle)
    }

    /// `trigger_translate(video_id, target_languages)` (§4.D).
    pub async fn trigger_translate(&self, video_id: &VideoId, target_languages: &[String]) -> OrchestratorResult<TranslateOutcome> {
        let video = self.videos.get_by_id(video_id).await?;

        let original = self
            .subtitles
            .find_active_original(video_id)
            .await?
            .filter(|s| s.status == SubtitleStatus::Ready)
            .ok_or_else(|| OrchestratorError::invalid_state("none", "ready original subtitle required"))?;

        let allowed = allowed_translate_targets(&original.language);
        let mut invalid_targets = Vec::new();
        let mut skipped_targets = Vec::new();
        let mut valid_targets = Vec::new();

        for target in target_languages {
            if !allowed.contains(&target.as_str()) {
                invalid_targets.push(target.clone());
                continue;
            }

            if let Some(existing) = self.subtitles.find_active_translation(video_id, target).await? {
                if existing.status == SubtitleStatus::Failed {
                    self.subtitles.delete(&existing.id).await?;
                } else {
                    skipped_targets.push(target.clone());
                    continue;
                }
            }
            valid_targets.push(target.clone());
        }

        if valid_targets.is_empty() {
            return Ok(TranslateOutcome { created: Vec::new(), invalid_targets, skipped_targets });
        }

        let mut created = Vec::new();
        for target in &valid_targets {
            let subtitle = Subtitle::new_translated(video_id.clone(), target.clone(), original.language.clone());
            self.subtitles.insert(&subtitle).await?;
            created.push(subtitle.id);
        }

        let srt_path = original.srt_path.clone().ok_or_else(|| OrchestratorError::validation("original subtitle has no srt_path"))?;
        let job = JobMessage::SubtitleTranslate(SubtitleTranslateJob {
            subtitle_ids: created.clone(),
            video_id: video.id.clone(),
            video_code: video.code.as_str().to_string(),
            source_srt_path: srt_path,
            source_language: original.language.clone(),
            target_languages: valid_targets,
            output_path: format!("subtitles/{}/", video.code.as_str()),
        });

        if let Err(e) = self.bus.publish_default(&job).await {
            for id in &created {
                self.subtitles.delete(id).await.ok();
            }
            return Err(OrchestratorError::from(e));
        }

        Ok(TranslateOutcome { created, invalid_targets, skipped_targets })
    }

    pub async fn job_started(&self, subtitle_id: &SubtitleId, job_type: &str) -> OrchestratorResult<Subtitle> {
        let Some(status) = SubtitleStatus::in_progress_for(job_type) else {
            return Err(OrchestratorError::validation(format!("unknown job type: {job_type}")));
        };

        let subtitle = self.subtitles.get_by_id(subtitle_id).await?;
        if subtitle.status != SubtitleStatus::Queued {
            // Idempotent: a duplicate/late start notification for a subtitle
            // already in progress or ready is a no-op success (§4.B).
            return Ok(subtitle);
        }
        self.subtitles.update_status(subtitle_id, status).await.map_err(OrchestratorError::from)
    }

    pub async fn detect_complete(&self, video_id: &VideoId, language: &str) -> OrchestratorResult<()> {
        self.videos.update_detected_language(video_id, language).await?;
        Ok(())
    }

    /// `transcribe_complete` (§4.D, §8 property 7, S4/S6): idempotent on a
    /// subtitle already `ready`; fires the auto-translate chain once.
    pub async fn transcribe_complete(&self, subtitle_id: &SubtitleId, srt_path: &str, language: Option<&str>) -> OrchestratorResult<Subtitle> {
        let current = self.subtitles.get_by_id(subtitle_id).await?;
        if current.status == SubtitleStatus::Ready {
            // Duplicate callback: no-op success, no auto-translate re-enqueued.
            return Ok(current);
        }

        let subtitle = self.subtitles.complete_ready(subtitle_id, srt_path, language).await?;

        // Auto-chain: failures here are non-fatal and logged (§4.D, §9 open
        // question 4: no confidence gate).
        let target = auto_chain_target(&subtitle.language);
        match self.trigger_translate(&subtitle.video_id, &[target.to_string()]).await {
            Ok(_) => info!(subtitle_id = %subtitle_id, target, "auto-translate chain enqueued"),
            Err(e) => warn!(subtitle_id = %subtitle_id, target, error = %e, "auto-translate chain failed"),
        }

        Ok(subtitle)
    }

    pub async fn translate_complete(&self, subtitle_id: &SubtitleId, srt_path: &str, language: &str) -> OrchestratorResult<Subtitle> {
        let current = self.subtitles.get_by_id(subtitle_id).await?;
        if current.status == SubtitleStatus::Ready {
            return Ok(current);
        }
        self.subtitles.complete_ready(subtitle_id, srt_path, Some(language)).await.map_err(OrchestratorError::from)
    }

    pub async fn failed(&self, subtitle_id: &SubtitleId, error: &str) -> OrchestratorResult<Subtitle> {
        self.subtitles.mark_failed(subtitle_id, error).await.map_err(OrchestratorError::from)
    }

    /// `retry_stuck()` (§4.D, §8 property 8): for every subtitle in
    /// `queued`, republish or, if superseded by a newer `ready` sibling,
    /// delete instead.
    pub async fn retry_stuck(&self) -> OrchestratorResult<(u32, u32)> {
        let stuck = self.subtitles.get_by_status(SubtitleStatus::Queued, 0, 1000).await?;
        let mut retried = 0u32;
        let mut deleted = 0u32;

        for subtitle in stuck {
            let sibling_ready = match subtitle.subtitle_type {
                SubtitleType::Original => self.subtitles.find_active_original(&subtitle.video_id).await?,
                SubtitleType::Translated => self.subtitles.find_active_translation(&subtitle.video_id, &subtitle.language).await?,
            }
            .filter(|s| s.id != subtitle.id && s.status == SubtitleStatus::Ready);

            if sibling_ready.is_some() {
                self.subtitles.delete(&subtitle.id).await?;
                deleted += 1;
                continue;
            }

            let result = match subtitle.subtitle_type {
                SubtitleType::Original => self.trigger_transcribe(&subtitle.video_id).await.map(|_| ()),
                SubtitleType::Translated => {
                    self.trigger_translate(&subtitle.video_id, &[subtitle.language.clone()]).await.map(|_| ())
                }
            };

            match result {
                Ok(()) => retried += 1,
                Err(e) => error!(subtitle_id = %subtitle.id, error = %e, "failed to retry stuck subtitle"),
            }
        }

        Ok((retried, deleted))
    }

    pub async fn content_get(&self, subtitle_id: &SubtitleId) -> OrchestratorResult<String> {
        let subtitle = self.subtitles.get_by_id(subtitle_id).await?;
        subtitle.srt_path.ok_or_else(|| OrchestratorError::NotFound)
    }

    pub async fn content_update(&self, subtitle_id: &SubtitleId, srt_path: &str) -> OrchestratorResult<()> {
        let subtitle = self.subtitles.get_by_id(subtitle_id).await?;
        if subtitle.status != SubtitleStatus::Ready {
            return Err(OrchestratorError::invalid_state(subtitle.status.as_str(), "ready"));
        }
        self.subtitles.update_content(subtitle_id, srt_path).await?;
        Ok(())
    }
}
