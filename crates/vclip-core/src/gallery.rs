//! Gallery orchestrator (§4.F): frame-extraction lifecycle over a video's
//! HLS output, plus admin image reclassification across safe/nsfw/source.

use std::sync::Arc;

use tracing::warn;
use vclip_db::VideoRepo;
use vclip_models::{GalleryStatus, VideoId};
use vclip_queue::{GalleryJob, JobBus, JobMessage};
use vclip_storage::R2Client;

use crate::error::{OrchestratorError, OrchestratorResult};

const MAX_GALLERY_FRAMES: u32 = 200;

pub struct GalleryOrchestrator {
    videos: Arc<VideoRepo>,
    bus: Arc<JobBus>,
    storage: Arc<R2Client>,
}

impl GalleryOrchestrator {
    pub fn new(videos: Arc<VideoRepo>, bus: Arc<JobBus>, storage: Arc<R2Client>) -> Self {
        Self { videos, bus, storage }
    }

    /// `generate(video_id)` (§4.F): requires a `ready` video with an HLS path.
    pub async fn generate(&self, video_id: &VideoId) -> OrchestratorResult<()> {
        let video = self.videos.get_by_id(video_id).await?;
        if video.status != vclip_models::VideoStatus::Ready {
            return Err(OrchestratorError::invalid_state(video.status.as_str(), "ready"));
        }
        let hls_path = video.hls_path.clone().ok_or_else(|| OrchestratorError::validation("video has no hls_path"))?;
        let quality = video.best_gallery_quality().ok_or_else(|| OrchestratorError::validation("video has no usable quality"))?.to_string();
        let duration = video.duration.ok_or_else(|| OrchestratorError::validation("video has no duration"))?;

        self.publish_gallery_job(&video.id, video.code.as_str(), &hls_path, &quality, duration).await?;
        self.videos.update_gallery_status(video_id, GalleryStatus::Processing).await?;
        Ok(())
    }

    /// `regenerate(video_id)` (§4.F): resets counts and republishes.
    pub async fn regenerate(&self, video_id: &VideoId) -> OrchestratorResult<()> {
        let video = self.videos.get_by_id(video_id).await?;
        let hls_path = video.hls_path.clone().ok_or_else(|| OrchestratorError::validation("video has no hls_path"))?;
        let quality = video.best_gallery_quality().ok_or_else(|| OrchestratorError::validation("video has no usable quality"))?.to_string();
        let duration = video.duration.ok_or_else(|| OrchestratorError::validation("video has no duration"))?;

        self.videos.update_gallery_counts(video_id, None, 0, 0, 0, 0, 0).await?;
        self.publish_gallery_job(&video.id, video.code.as_str(), &hls_path, &quality, duration).await?;
        self.videos.update_gallery_status(video_id, GalleryStatus::Processing).await?;
        Ok(())
    }

    async fn publish_gallery_job(&self, video_id: &VideoId, code: &str, hls_path: &str, quality: &str, duration: f64) -> OrchestratorResult<()> {
        let job = JobMessage::Gallery(GalleryJob {
            video_id: video_id.clone(),
            code: code.to_string(),
            hls_path: hls_path.to_string(),
            quality: quality.to_string(),
            duration,
            output_path: format!("gallery/{code}/"),
            max_frames: MAX_GALLERY_FRAMES,
        });
        self.bus.publish_default(&job).await.map(|_| ()).map_err(OrchestratorError::from)
    }

    /// Worker callback: persists counts and moves to `pending_review`
    /// pending admin approval (§4.F).
    pub async fn update_gallery(
        &self,
        video_id: &VideoId,
        gallery_path: &str,
        source_count: u32,
        count: u32,
        safe_count: u32,
        nsfw_count: u32,
        super_safe_count: u32,
    ) -> OrchestratorResult<()> {
        self.videos
            .update_gallery_counts(video_id, Some(gallery_path), source_count, count, safe_count, nsfw_count, super_safe_count)
            .await?;
        self.videos.update_gallery_status(video_id, GalleryStatus::PendingReview).await?;
        Ok(())
    }

    /// `publish_gallery(video_id)` (§4.F): admin approval — recounts
    /// safe/nsfw subprefixes from the blob store and sets `ready`.
    pub async fn publish_gallery(&self, video_id: &VideoId) -> OrchestratorResult<()> {
        let video = self.videos.get_by_id(video_id).await?;
        let code = video.code.as_str();

        let safe_count = self.storage.list_objects(&format!("gallery/{code}/safe/")).await?.len() as u32;
        let nsfw_count = self.storage.list_objects(&format!("gallery/{code}/nsfw/")).await?.len() as u32;
        let source_count = self.storage.list_objects(&format!("gallery/{code}/source/")).await?.len() as u32;

        self.videos
            .update_gallery_counts(video_id, None, source_count, safe_count + nsfw_count, safe_count, nsfw_count, video.gallery_super_safe_count)
            .await?;
        self.videos.update_gallery_status(video_id, GalleryStatus::Ready).await?;
        Ok(())
    }

    /// `move_image` (§4.F): copy-then-delete across `source|safe|nsfw`
    /// subprefixes; on delete failure the destination copy is removed to
    /// restore "exactly one copy per filename".
    pub async fn move_image(&self, code: &str, filename: &str, from: &str, to: &str) -> OrchestratorResult<()> {
        self.move_one(code, filename, from, to).await
    }

    /// `move_batch` (§4.F): applies `move_image` to every filename, best-effort.
    pub async fn move_batch(&self, code: &str, filenames: &[String], from: &str, to: &str) -> OrchestratorResult<(u32, u32)> {
        let mut succeeded = 0u32;
        let mut failed = 0u32;
        for filename in filenames {
            match self.move_one(code, filename, from, to).await {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(code, filename, error = %e, "gallery image move failed");
                    failed += 1;
                }
            }
        }
        Ok((succeeded, failed))
    }

    async fn move_one(&self, code: &str, filename: &str, from: &str, to: &str) -> OrchestratorResult<()> {
        let src_key = format!("gallery/{code}/{from}/{filename}");
        let dst_key = format!("gallery/{code}/{to}/{filename}");

        let bytes = self.storage.download_bytes(&src_key).await?;
        self.storage.upload_bytes(bytes, &dst_key, "image/jpeg").await?;

        if let Err(e) = self.storage.delete_object(&src_key).await {
            // Restore the "exactly one copy" invariant: undo the copy.
            self.storage.delete_object(&dst_key).await.ok();
            return Err(OrchestratorError::from(e));
        }

        Ok(())
    }
}
