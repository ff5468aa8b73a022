//! Warm-cache orchestrator (§4.G): backfills CDN/edge cache for `ready`
//! videos that have not yet been warmed.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use vclip_db::VideoRepo;
use vclip_models::{CacheStatus, VideoStatus};
use vclip_queue::{JobBus, JobMessage, WarmCacheJob};

use crate::error::OrchestratorResult;

/// Priority used for manual/backfill warm requests (§4.G).
const BACKFILL_PRIORITY: u8 = 3;

/// Placeholder per-quality segment-count estimate (§4.G: "value 100 as a
/// placeholder for an implementer-supplied estimate").
const SEGMENT_COUNT_ESTIMATE: u32 = 100;

pub struct WarmCacheOrchestrator {
    videos: Arc<VideoRepo>,
    bus: Arc<JobBus>,
}

impl WarmCacheOrchestrator {
    pub fn new(videos: Arc<VideoRepo>, bus: Arc<JobBus>) -> Self {
        Self { videos, bus }
    }

    /// Enumerates `ready` videos with `cache_status` in `{pending, failed}`
    /// and publishes a warm-cache job for each; sets `cache_status =
    /// warming` on publish success.
    pub async fn backfill(&self, include_failed: bool) -> OrchestratorResult<u32> {
        let mut candidates = self.videos.get_by_status(VideoStatus::Ready, 0, 10_000).await?;
        candidates.retain(|v| {
            v.cache_status == CacheStatus::Pending || (include_failed && v.cache_status == CacheStatus::Failed)
        });

        let mut warmed = 0u32;
        for video in candidates {
            let Some(hls_path) = video.hls_path.clone() else { continue };
            let segment_counts: HashMap<String, u32> =
                video.quality_sizes.keys().map(|q| (q.clone(), SEGMENT_COUNT_ESTIMATE)).collect();

            let job = JobMessage::WarmCache(WarmCacheJob {
                video_id: video.id.clone(),
                code: video.code.as_str().to_string(),
                hls_prefix: hls_path,
                segment_counts,
                priority: BACKFILL_PRIORITY,
            });

            match self.bus.publish_default(&job).await {
                Ok(_) => {
                    if let Err(e) = self.videos.update_cache_status(&video.id, CacheStatus::Warming).await {
                        warn!(video_id = %video.id, error = %e, "failed to mark video warming after publish");
                        continue;
                    }
                    warmed += 1;
                }
                Err(e) => warn!(video_id = %video.id, error = %e, "warm-cache publish failed"),
            }
        }

        info!(count = warmed, "published warm-cache jobs");
        Ok(warmed)
    }

    pub async fn warm_complete(&self, video_id: &vclip_models::VideoId) -> OrchestratorResult<()> {
        self.videos.update_cache_status(video_id, CacheStatus::Cached).await?;
        Ok(())
    }

    pub async fn warm_failed(&self, video_id: &vclip_models::VideoId) -> OrchestratorResult<()> {
        self.videos.update_cache_status(video_id, CacheStatus::Failed).await?;
        Ok(())
    }
}
