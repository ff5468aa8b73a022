//! Queue admin service (§4.I): per-class stats, paged failed/stuck
//! listings, and bulk retry/clear primitives.

use std::sync::Arc;

use tracing::warn;
use vclip_db::{SubtitleRepo, VideoRepo};
use vclip_models::{Subtitle, SubtitleStatus, Video, VideoStatus};
use vclip_queue::{JobBus, Subject};

use crate::error::OrchestratorResult;
use crate::subtitle::SubtitleOrchestrator;
use crate::transcoding::TranscodingOrchestrator;

/// Cap on how many records a single `retry_all` sweep will touch (§4.I).
const RETRY_ALL_CAP: i64 = 1000;

pub struct QueueDepth {
    pub subject: Subject,
    pub depth: u64,
    pub dlq_depth: u64,
}

pub struct AdminService {
    videos: Arc<VideoRepo>,
    subtitles: Arc<SubtitleRepo>,
    bus: Arc<JobBus>,
    transcoding: Arc<TranscodingOrchestrator>,
    subtitle_orchestrator: Arc<SubtitleOrchestrator>,
}

impl AdminService {
    pub fn new(
        videos: Arc<VideoRepo>,
        subtitles: Arc<SubtitleRepo>,
        bus: Arc<JobBus>,
        transcoding: Arc<TranscodingOrchestrator>,
        subtitle_orchestrator: Arc<SubtitleOrchestrator>,
    ) -> Self {
        Self { videos, subtitles, bus, transcoding, subtitle_orchestrator }
    }

    /// Per-subject depth/DLQ-depth across all seven streams.
    pub async fn queue_stats(&self) -> OrchestratorResult<Vec<QueueDepth>> {
        let mut stats = Vec::with_capacity(Subject::ALL.len());
        for subject in Subject::ALL {
            stats.push(QueueDepth {
                subject,
                depth: self.bus.depth(subject).await?,
                dlq_depth: self.bus.dlq_depth(subject).await?,
            });
        }
        Ok(stats)
    }

    pub async fn get_failed_videos(&self, page: i64, limit: i64) -> OrchestratorResult<Vec<Video>> {
        Ok(self.videos.get_by_status(VideoStatus::Failed, page * limit, limit).await?)
    }

    pub async fn get_stuck_videos(&self, page: i64, limit: i64) -> OrchestratorResult<Vec<Video>> {
        let mut stuck = self.videos.get_by_status(VideoStatus::Processing, page * limit, limit).await?;
        stuck.extend(self.videos.get_by_status(VideoStatus::Queued, page * limit, limit).await?);
        Ok(stuck)
    }

    pub async fn retry_one_video(&self, video_id: &vclip_models::VideoId) -> OrchestratorResult<Video> {
        self.transcoding.queue(video_id).await
    }

    /// `retry_all()` (§4.I): iterates up to `RETRY_ALL_CAP` failed videos.
    pub async fn retry_all_videos(&self) -> OrchestratorResult<(u32, u32)> {
        let failed = self.videos.get_by_status(VideoStatus::Failed, 0, RETRY_ALL_CAP).await?;
        let mut retried = 0u32;
        let mut errored = 0u32;

        for video in failed {
            match self.transcoding.queue(&video.id).await {
                Ok(_) => retried += 1,
                Err(e) => {
                    warn!(video_id = %video.id, error = %e, "retry_all: failed to re-queue video");
                    errored += 1;
                }
            }
        }

        Ok((retried, errored))
    }

    pub async fn get_failed_subtitles(&self, page: i64, limit: i64) -> OrchestratorResult<Vec<Subtitle>> {
        Ok(self.subtitles.get_by_status(SubtitleStatus::Failed, page * limit, limit).await?)
    }

    pub async fn get_stuck_subtitles(&self, page: i64, limit: i64) -> OrchestratorResult<Vec<Subtitle>> {
        Ok(self.subtitles.get_by_status(SubtitleStatus::Queued, page * limit, limit).await?)
    }

    /// `clear_all()` (§4.I): subtitle-only. Purges the three `subtitle.*`
    /// streams one at a time (transcode/warmcache untouched), then deletes
    /// the stuck DB records.
    pub async fn clear_all_subtitles(&self) -> OrchestratorResult<(u64, u32)> {
        let mut purged = 0u64;
        for subject in Subject::SUBTITLE {
            purged += self.bus.purge(subject).await?;
        }

        let stuck = self.subtitles.get_by_status(SubtitleStatus::Queued, 0, RETRY_ALL_CAP).await?;
        let mut deleted = 0u32;
        for subtitle in stuck {
            if self.subtitles.delete(&subtitle.id).await.is_ok() {
                deleted += 1;
            }
        }

        Ok((purged, deleted))
    }

    /// `queue_missing_subtitles()` (§4.I): enumerate `ready` videos with
    /// `audio_path`, skip those with an existing non-failed original
    /// subtitle, delete `failed` originals, call `trigger_transcribe`.
    pub async fn queue_missing_subtitles(&self) -> OrchestratorResult<(u32, u32)> {
        let ready = self.videos.get_by_status(VideoStatus::Ready, 0, RETRY_ALL_CAP).await?;
        let mut queued = 0u32;
        let mut skipped = 0u32;

        for video in ready {
            if video.audio_path.is_none() {
                skipped += 1;
                continue;
            }

            // `trigger_transcribe` already refuses if a non-failed original
            // exists and cleans up a `failed` one before creating a new
            // record, so its own preconditions double as the skip logic here.
            match self.subtitle_orchestrator.trigger_transcribe(&video.id).await {
                Ok(_) => queued += 1,
                Err(e) => {
                    warn!(video_id = %video.id, error = %e, "queue_missing_subtitles: skipped video");
                    skipped += 1;
                }
            }
        }

        Ok((queued, skipped))
    }
}
