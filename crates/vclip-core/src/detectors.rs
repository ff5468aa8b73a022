//! Stuck detectors (§4.H): periodic sweeps that fail entities stuck in an
//! in-progress state for longer than their timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};
use vclip_db::{SubtitleRepo, VideoRepo};
use vclip_models::VideoStatus;

use crate::error::OrchestratorResult;

/// Cadence shared by all three sweeps (§4.H).
const DETECTION_INTERVAL: Duration = Duration::from_secs(30);

const PROCESSING_TIMEOUT_SECS: i64 = 60;
const PENDING_TIMEOUT_SECS: i64 = 5 * 60;
const SUBTITLE_TIMEOUT_SECS: i64 = 10 * 60;

pub struct StuckDetectors {
    videos: Arc<VideoRepo>,
    subtitles: Arc<SubtitleRepo>,
}

impl StuckDetectors {
    pub fn new(videos: Arc<VideoRepo>, subtitles: Arc<SubtitleRepo>) -> Self {
        Self { videos, subtitles }
    }

    /// Spawns the background loop. Intended to run for the life of the process.
    pub async fn run(&self) {
        info!(interval = ?DETECTION_INTERVAL, "starting stuck-job detectors");
        let mut ticker = interval(DETECTION_INTERVAL);

        loop {
            ticker.tick().await;
            if let Err(e) = self.check_once().await {
                error!(error = %e, "stuck-job detection sweep failed");
            }
        }
    }

    /// Runs all three sweeps once; returns `(processing_failed, pending_failed, subtitles_failed)`.
    pub async fn check_once(&self) -> OrchestratorResult<(u32, u32, u32)> {
        let processing_failed = self.processing_timeout().await?;
        let pending_failed = self.pending_timeout().await?;
        let subtitles_failed = self.subtitle_timeout().await?;

        if processing_failed + pending_failed + subtitles_failed > 0 {
            info!(processing_failed, pending_failed, subtitles_failed, "stuck-job sweep complete");
        }

        Ok((processing_failed, pending_failed, subtitles_failed))
    }

    /// Videos whose `processing_started_at` is older than 1 minute.
    async fn processing_timeout(&self) -> OrchestratorResult<u32> {
        let threshold = Utc::now() - chrono::Duration::seconds(PROCESSING_TIMEOUT_SECS);
        let stuck = self.videos.get_stuck_processing(threshold).await?;
        let mut failed = 0u32;

        for video in stuck {
            let reason = format!("Processing timeout: worker not responding for more than {} minute", PROCESSING_TIMEOUT_SECS / 60);
            match self.videos.mark_failed(&video.id, &reason, u32::MAX).await {
                Ok(_) => {
                    warn!(video_id = %video.id, "marked stuck processing video as failed");
                    failed += 1;
                }
                Err(e) => error!(video_id = %video.id, error = %e, "failed to mark stuck video as failed"),
            }
        }

        Ok(failed)
    }

    /// Videos in `pending` older than 5 minutes.
    async fn pending_timeout(&self) -> OrchestratorResult<u32> {
        let threshold = Utc::now() - chrono::Duration::seconds(PENDING_TIMEOUT_SECS);
        let stuck = self.videos.get_stuck_by_status(VideoStatus::Pending, threshold).await?;
        let mut failed = 0u32;

        for video in stuck {
            let reason = format!("Pending timeout: job was not published to queue within {} minutes", PENDING_TIMEOUT_SECS / 60);
            match self.videos.mark_failed(&video.id, &reason, u32::MAX).await {
                Ok(_) => {
                    warn!(video_id = %video.id, "marked stuck pending video as failed");
                    failed += 1;
                }
                Err(e) => error!(video_id = %video.id, error = %e, "failed to mark stuck video as failed"),
            }
        }

        Ok(failed)
    }

    /// Subtitles in `processing|translating|detecting` older than 10 minutes.
    async fn subtitle_timeout(&self) -> OrchestratorResult<u32> {
        let threshold = Utc::now() - chrono::Duration::seconds(SUBTITLE_TIMEOUT_SECS);
        let stuck = self.subtitles.get_stuck_in_progress(threshold).await?;
        let mut failed = 0u32;

        for subtitle in stuck {
            let reason = format!("Processing timeout: worker not responding for more than {} minutes", SUBTITLE_TIMEOUT_SECS / 60);
            match self.subtitles.mark_failed(&subtitle.id, &reason).await {
                Ok(_) => {
                    warn!(subtitle_id = %subtitle.id, "marked stuck subtitle as failed");
                    failed += 1;
                }
                Err(e) => error!(subtitle_id = %subtitle.id, error = %e, "failed to mark stuck subtitle as failed"),
            }
        }

        Ok(failed)
    }
}
