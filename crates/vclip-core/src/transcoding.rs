//! Transcoding orchestrator (§4.C): the Video lifecycle state machine,
//! queue-overflow admission, retry/DLQ bookkeeping, and completion
//! callback handling.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use vclip_db::VideoRepo;
use vclip_models::{Video, VideoId, VideoStatus};
use vclip_queue::{JobBus, JobMessage, Subject, TranscodeJob};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::settings::SettingsCache;

/// Two injected capabilities, pure methods, no global singleton (§9).
pub struct TranscodingOrchestrator {
    store: Arc<VideoRepo>,
    bus: Arc<JobBus>,
    settings: Arc<SettingsCache>,
    cleanup_original: bool,
}

impl TranscodingOrchestrator {
    pub fn new(store: Arc<VideoRepo>, bus: Arc<JobBus>, settings: Arc<SettingsCache>, cleanup_original: bool) -> Self {
        Self { store, bus, settings, cleanup_original }
    }

    /// `queue(video_id)` (§4.C): allowed only from `{pending, queued, failed}`.
    pub async fn queue(&self, video_id: &VideoId) -> OrchestratorResult<Video> {
        let video = self.store.get_by_id(video_id).await?;

        if !matches!(video.status, VideoStatus::Pending | VideoStatus::Queued | VideoStatus::Failed) {
            return Err(OrchestratorError::invalid_state(video.status.as_str(), VideoStatus::Queued.as_str()));
        }

        // Already queued with a pending message for this attempt: succeed
        // without republishing (§4.C tie-break rule).
        if video.status == VideoStatus::Queued
            && self.bus.has_pending_duplicate(Subject::TranscodeJobs, video_id.as_str()).await?
        {
            return Ok(video);
        }

        let max_queue_size = self.settings.max_queue_size();
        if max_queue_size > 0 {
            let depth = self.bus.depth(Subject::TranscodeJobs).await?;
            if depth >= max_queue_size {
                return Err(OrchestratorError::queue_overflow(depth, max_queue_size));
            }
        }

        let video = if video.status == VideoStatus::Failed {
            self.store.reset_for_retry(video_id).await?
        } else {
            video
        };

        let qualities = self.settings.qualities();
        let original_path = video.original_path.clone().ok_or_else(|| OrchestratorError::validation("video has no original_path"))?;

        let job = JobMessage::Transcode(TranscodeJob {
            video_id: video.id.clone(),
            video_code: video.code.as_str().to_string(),
            input_path: original_path,
            output_path: format!("videos/{}/", video.code.as_str()),
            codec: "h265".to_string(),
            qualities,
            use_byte_range: false,
        });

        // The status transition to `queued` occurs only after successful
        // publish; on failure the video stays in its prior status (§4.C).
        self.bus.publish_default(&job).await?;

        self.store.update_status(video_id, VideoStatus::Queued).await.map_err(OrchestratorError::from)
    }

    /// `job_started` callback: `queued -> processing`, stamps `processing_started_at`.
    pub async fn job_started(&self, video_id: &VideoId) -> OrchestratorResult<Video> {
        let video = self.store.get_by_id(video_id).await?;
        if video.status != VideoStatus::Queued {
            // Idempotent: a duplicate start notification for an already
            // processing/ready video is a no-op success (§4.B).
            return Ok(video);
        }
        self.store.update_status(video_id, VideoStatus::Processing).await.map_err(OrchestratorError::from)
    }

    /// Worker-reported 0-100 progress mapped into the user-visible 10-80 band (§4.C).
    pub fn progress_band(worker_percent: u32) -> u32 {
        10 + (worker_percent.min(100) * 70) / 100
    }

    /// Completion callback: writes HLS outputs and transitions to `ready`.
    #[allow(clippy::too_many_arguments)]
    pub async fn complete(
        &self,
        video_id: &VideoId,
        hls_path: &str,
        hls_path_h264: Option<&str>,
        duration: f64,
        quality: &str,
        disk_usage: u64,
        quality_sizes: &HashMap<String, u64>,
        thumbnail_url: Option<&str>,
    ) -> OrchestratorResult<Video> {
        let video = self.store.get_by_id(video_id).await?;
        if video.status == VideoStatus::Ready {
            // Duplicate completion callback: no-op success (§4.B, §8 property 7).
            return Ok(video);
        }

        let video = self
            .store
            .update_hls_output(video_id, hls_path, hls_path_h264, duration, quality, disk_usage, quality_sizes, thumbnail_url)
            .await?;

        if self.cleanup_original {
            // Storage errors on this non-critical path are logged and
            // swallowed (§7): the transcode is complete either way.
            if let Err(e) = self.store.clear_original_path(video_id).await {
                warn!(video_id = %video_id, error = %e, "failed to clear original_path after cleanup");
            }
        }

        Ok(video)
    }

    /// Orchestrator-level retry (admin-triggered or on certain worker
    /// errors). The bus itself never auto-retries past `max_retries` (§4.C).
    pub async fn mark_failed(&self, video_id: &VideoId, error: &str) -> OrchestratorResult<Video> {
        // The retry ceiling has no dedicated settings key in the source
        // (§9 open question 1); it is consolidated here as the bus's
        // configured `max_retries`.
        self.store.mark_failed(video_id, error, self.bus.max_retries()).await.map_err(OrchestratorError::from)
    }

    /// `recover_stuck_jobs` (§4.C): boot-time recovery, scans `processing`
    /// videos and resets them to `pending`, then re-queues.
    pub async fn recover_stuck_jobs(&self) -> OrchestratorResult<u32> {
        let stuck = self.store.get_by_status(VideoStatus::Processing, 0, 1000).await?;
        let mut recovered = 0u32;

        for video in stuck {
            // `reset_for_retry` only moves to `pending` from any status; the
            // transition graph does not gate it the way `update_status` does.
            if let Err(e) = self.store.reset_for_retry(&video.id).await {
                warn!(video_id = %video.id, error = %e, "failed to reset stuck job on boot");
                continue;
            }
            if self.queue(&video.id).await.is_ok() {
                recovered += 1;
            }
        }

        info!(count = recovered, "recovered stuck transcode jobs on boot");
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_band_maps_into_10_to_80_range() {
        assert_eq!(TranscodingOrchestrator::progress_band(0), 10);
        assert_eq!(TranscodingOrchestrator::progress_band(50), 45);
        assert_eq!(TranscodingOrchestrator::progress_band(100), 80);
    }

    #[test]
    fn progress_band_clamps_worker_percent_over_100() {
        assert_eq!(TranscodingOrchestrator::progress_band(150), 80);
    }
}
