//! Worker callback handlers (§2): workers report job outcomes here, and each
//! callback calls back into the owning orchestrator to mutate entity state.
//! There is no caller-identity check on this surface — workers authenticate
//! at the network boundary (internal service mesh / shared secret), not
//! per-request like the user-facing handlers.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use vclip_models::{ReelId, SubtitleId, VideoId};

use crate::error::ApiResult;
use crate::state::AppState;

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

#[derive(Deserialize)]
pub struct TranscodeStartedRequest {
    pub video_id: String,
}

pub async fn transcode_started(State(state): State<AppState>, Json(body): Json<TranscodeStartedRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state.transcoding.job_started(&id).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct TranscodeCompleteRequest {
    pub video_id: String,
    pub hls_path: String,
    #[serde(default)]
    pub hls_path_h264: Option<String>,
    pub duration: f64,
    pub quality: String,
    pub disk_usage: u64,
    #[serde(default)]
    pub quality_sizes: HashMap<String, u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

pub async fn transcode_complete(State(state): State<AppState>, Json(body): Json<TranscodeCompleteRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state
        .transcoding
        .complete(
            &id,
            &body.hls_path,
            body.hls_path_h264.as_deref(),
            body.duration,
            &body.quality,
            body.disk_usage,
            &body.quality_sizes,
            body.thumbnail_url.as_deref(),
        )
        .await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct TranscodeFailedRequest {
    pub video_id: String,
    pub error: String,
}

pub async fn transcode_failed(State(state): State<AppState>, Json(body): Json<TranscodeFailedRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state.transcoding.mark_failed(&id, &body.error).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct SubtitleJobStartedRequest {
    pub subtitle_id: String,
    pub job_type: String,
}

pub async fn subtitle_job_started(State(state): State<AppState>, Json(body): Json<SubtitleJobStartedRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = SubtitleId::from_string(body.subtitle_id);
    state.subtitle_orchestrator.job_started(&id, &body.job_type).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct DetectCompleteRequest {
    pub video_id: String,
    pub language: String,
}

pub async fn subtitle_detect_complete(State(state): State<AppState>, Json(body): Json<DetectCompleteRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state.subtitle_orchestrator.detect_complete(&id, &body.language).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct TranscribeCompleteRequest {
    pub subtitle_id: String,
    pub srt_path: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub async fn subtitle_transcribe_complete(
    State(state): State<AppState>,
    Json(body): Json<TranscribeCompleteRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = SubtitleId::from_string(body.subtitle_id);
    state.subtitle_orchestrator.transcribe_complete(&id, &body.srt_path, body.language.as_deref()).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct TranslateCompleteRequest {
    pub subtitle_id: String,
    pub srt_path: String,
    pub language: String,
}

pub async fn subtitle_translate_complete(
    State(state): State<AppState>,
    Json(body): Json<TranslateCompleteRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = SubtitleId::from_string(body.subtitle_id);
    state.subtitle_orchestrator.translate_complete(&id, &body.srt_path, &body.language).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct SubtitleFailedRequest {
    pub subtitle_id: String,
    pub error: String,
}

pub async fn subtitle_failed(State(state): State<AppState>, Json(body): Json<SubtitleFailedRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = SubtitleId::from_string(body.subtitle_id);
    state.subtitle_orchestrator.failed(&id, &body.error).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct ReelExportCompleteRequest {
    pub reel_id: String,
}

pub async fn reel_export_complete(State(state): State<AppState>, Json(body): Json<ReelExportCompleteRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = ReelId::from_string(body.reel_id);
    state.reel_orchestrator.export_complete(&id).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct ReelExportFailedRequest {
    pub reel_id: String,
    pub error: String,
}

pub async fn reel_export_failed(State(state): State<AppState>, Json(body): Json<ReelExportFailedRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = ReelId::from_string(body.reel_id);
    state.reel_orchestrator.export_failed(&id, &body.error).await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct GalleryUpdateRequest {
    pub video_id: String,
    pub gallery_path: String,
    pub source_count: u32,
    pub count: u32,
    pub safe_count: u32,
    pub nsfw_count: u32,
    pub super_safe_count: u32,
}

pub async fn gallery_update(State(state): State<AppState>, Json(body): Json<GalleryUpdateRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state
        .gallery_orchestrator
        .update_gallery(&id, &body.gallery_path, body.source_count, body.count, body.safe_count, body.nsfw_count, body.super_safe_count)
        .await?;
    Ok(ok())
}

#[derive(Deserialize)]
pub struct WarmCacheResultRequest {
    pub video_id: String,
}

pub async fn warmcache_complete(State(state): State<AppState>, Json(body): Json<WarmCacheResultRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state.warmcache_orchestrator.warm_complete(&id).await?;
    Ok(ok())
}

pub async fn warmcache_failed(State(state): State<AppState>, Json(body): Json<WarmCacheResultRequest>) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(body.video_id);
    state.warmcache_orchestrator.warm_failed(&id).await?;
    Ok(ok())
}
