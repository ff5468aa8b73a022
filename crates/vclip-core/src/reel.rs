//! Reel orchestrator (§4.E): segment validation, draft/export/ready lifecycle,
//! background delete of exported output.

use std::sync::Arc;

use tracing::warn;
use vclip_db::{ReelRepo, VideoRepo};
use vclip_models::{validate_segments, Composition, Reel, ReelId, ReelStatus, Segment, VideoId};
use vclip_queue::{JobBus, JobMessage, ReelExportJob};
use vclip_storage::R2Client;

use crate::error::{OrchestratorError, OrchestratorResult};

pub struct ReelOrchestrator {
    reels: Arc<ReelRepo>,
    videos: Arc<VideoRepo>,
    bus: Arc<JobBus>,
    storage: Arc<R2Client>,
}

impl ReelOrchestrator {
    pub fn new(reels: Arc<ReelRepo>, videos: Arc<VideoRepo>, bus: Arc<JobBus>, storage: Arc<R2Client>) -> Self {
        Self { reels, videos, bus, storage }
    }

    /// `create` (§4.E): validates segments against the owning video's
    /// duration before persisting a `draft` record.
    pub async fn create(
        &self,
        video_id: &VideoId,
        user_id: &str,
        title: &str,
        segments: Vec<Segment>,
        composition: Composition,
    ) -> OrchestratorResult<Reel> {
        let video = self.videos.get_by_id(video_id).await?;
        validate_segments(&segments, video.duration.unwrap_or(0.0))
            .map_err(|e| OrchestratorError::validation(e.to_string()))?;

        let reel = Reel::new(video_id.clone(), user_id, title, segments, composition);
        self.reels.insert(&reel).await?;
        Ok(reel)
    }

    /// `update` (§4.E): refused while `exporting`; segments re-validated.
    pub async fn update(
        &self,
        reel_id: &ReelId,
        title: &str,
        segments: Vec<Segment>,
        cover_time: Option<f64>,
        composition: Composition,
    ) -> OrchestratorResult<Reel> {
        let reel = self.reels.get_by_id(reel_id).await?;
        if reel.status.blocks_mutation() {
            return Err(OrchestratorError::conflict("reel is exporting"));
        }

        let video = self.videos.get_by_id(&reel.video_id).await?;
        validate_segments(&segments, video.duration.unwrap_or(0.0))
            .map_err(|e| OrchestratorError::validation(e.to_string()))?;

        self.reels
            .update_segments_and_composition(reel_id, &segments, cover_time, &composition, title)
            .await
            .map_err(OrchestratorError::from)
    }

    /// `export` (§4.E): allowed from `draft`, `ready`, or `failed`
    /// (re-export). On publish failure the status rolls to `failed` with a
    /// deterministic reason rather than staying stuck in `exporting`.
    pub async fn export(&self, reel_id: &ReelId) -> OrchestratorResult<Reel> {
        let reel = self.reels.get_by_id(reel_id).await?;
        if reel.status == ReelStatus::Exporting {
            return Err(OrchestratorError::conflict("reel is already exporting"));
        }

        let reel = self.reels.update_status(reel_id, ReelStatus::Exporting).await?;

        let job = JobMessage::ReelExport(ReelExportJob {
            reel_id: reel.id.clone(),
            video_id: reel.video_id.clone(),
            composition: serde_json::to_value(&reel.composition).map_err(|e| OrchestratorError::validation(e.to_string()))?,
            segments: serde_json::to_value(&reel.segments).map_err(|e| OrchestratorError::validation(e.to_string()))?,
            output_path: format!("reels/{}/", reel.id.as_str()),
        });

        if let Err(e) = self.bus.publish_default(&job).await {
            warn!(reel_id = %reel_id, error = %e, "reel export publish failed, rolling back to failed");
            return self
                .reels
                .mark_failed(reel_id, "Failed to publish export job: bus unavailable")
                .await
                .map_err(OrchestratorError::from);
        }

        Ok(reel)
    }

    /// Idempotent on a reel already `ready`; otherwise only meaningful for a
    /// reel actually `exporting` (§3 Invariant 5) — a duplicate or misrouted
    /// callback must not force a `draft` reel straight to `ready`.
    pub async fn export_complete(&self, reel_id: &ReelId) -> OrchestratorResult<Reel> {
        let reel = self.reels.get_by_id(reel_id).await?;
        if reel.status == ReelStatus::Ready {
            return Ok(reel);
        }
        if reel.status != ReelStatus::Exporting {
            return Err(OrchestratorError::invalid_state(reel.status.as_str(), ReelStatus::Ready.as_str()));
        }
        self.reels.mark_ready(reel_id).await.map_err(OrchestratorError::from)
    }

    /// Idempotent on a reel already `failed`; otherwise only meaningful for a
    /// reel actually `exporting` (§3 Invariant 5).
    pub async fn export_failed(&self, reel_id: &ReelId, error: &str) -> OrchestratorResult<Reel> {
        let reel = self.reels.get_by_id(reel_id).await?;
        if reel.status == ReelStatus::Failed {
            return Ok(reel);
        }
        if reel.status != ReelStatus::Exporting {
            return Err(OrchestratorError::invalid_state(reel.status.as_str(), ReelStatus::Failed.as_str()));
        }
        self.reels.mark_failed(reel_id, error).await.map_err(OrchestratorError::from)
    }

    /// `delete` (§4.E): refused in `exporting`; a `ready` reel's exported
    /// blobs are removed in the background, best-effort.
    pub async fn delete(&self, reel_id: &ReelId) -> OrchestratorResult<()> {
        let reel = self.reels.get_by_id(reel_id).await?;
        if reel.status.blocks_mutation() {
            return Err(OrchestratorError::conflict("reel is exporting"));
        }

        if reel.status == ReelStatus::Ready {
            let prefix = format!("reels/{}/", reel.id.as_str());
            match self.storage.list_objects(&prefix).await {
                Ok(objects) => {
                    let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
                    if let Err(e) = self.storage.delete_objects(&keys).await {
                        warn!(reel_id = %reel_id, error = %e, "failed to delete reel output objects");
                    }
                }
                Err(e) => warn!(reel_id = %reel_id, error = %e, "failed to list reel output prefix"),
            }
        }

        self.reels.delete(reel_id).await.map_err(OrchestratorError::from)
    }
}
