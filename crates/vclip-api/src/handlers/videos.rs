//! Video handlers: thin adapters over the entity store and the transcoding
//! orchestrator. No clip, credit, or classification concepts live here —
//! those belong to the worker side, not the job orchestration plane.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use vclip_core::OrchestratorError;
use vclip_models::{Video, VideoId, VideoStatus};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::{is_valid_video_id, sanitize_title};
use crate::state::AppState;

#[derive(Serialize)]
pub struct VideoResponse {
    pub id: String,
    pub code: String,
    pub status: String,
    pub title: String,
    pub description: Option<String>,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub hls_path: Option<String>,
    pub duration: Option<f64>,
    pub quality: Option<String>,
    pub disk_usage: u64,
    pub thumbnail_url: Option<String>,
    pub cache_status: String,
    pub cache_percentage: u32,
    pub gallery_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(v: Video) -> Self {
        Self {
            id: v.id.as_str().to_string(),
            code: v.code.as_str().to_string(),
            status: v.status.as_str().to_string(),
            title: v.title,
            description: v.description,
            retry_count: v.retry_count,
            last_error: v.last_error,
            hls_path: v.hls_path,
            duration: v.duration,
            quality: v.quality,
            disk_usage: v.disk_usage,
            thumbnail_url: v.thumbnail_url,
            cache_status: v.cache_status.as_str().to_string(),
            cache_percentage: v.cache_percentage,
            gallery_status: v.gallery_status.as_str().to_string(),
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    pub original_path: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Register a newly uploaded source and queue it for transcoding. The
/// upload itself (presigned URL, direct-to-blob PUT) happens before this
/// call lands; `original_path` is the blob key the caller already wrote to.
pub async fn create_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateVideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    let title = sanitize_title(&body.title);
    if title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    if body.original_path.trim().is_empty() {
        return Err(ApiError::bad_request("original_path is required"));
    }

    let mut video = Video::new(&user.uid, title, body.original_path);
    video.description = body.description;

    state.videos.insert(&video).await.map_err(OrchestratorError::from)?;
    let video = state.transcoding.queue(&video.id).await?;

    info!(video_id = %video.id, user_id = %user.uid, "video created and queued");
    Ok(Json(video.into()))
}

async fn load_owned(state: &AppState, user: &AuthUser, video_id: &str) -> ApiResult<Video> {
    if !is_valid_video_id(video_id) {
        return Err(ApiError::bad_request("invalid video id"));
    }
    let id = VideoId::from_string(video_id);
    let video = state.videos.get_by_id(&id).await.map_err(OrchestratorError::from)?;
    if video.user_id != user.uid {
        // Cross-tenant access looks identical to a missing record.
        return Err(ApiError::not_found("video not found"));
    }
    Ok(video)
}

pub async fn get_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let video = load_owned(&state, &user, &video_id).await?;
    Ok(Json(video.into()))
}

pub async fn delete_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let video = load_owned(&state, &user, &video_id).await?;
    state.videos.delete(&video.id).await.map_err(OrchestratorError::from)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Re-queue a `failed` video, or re-trigger an already-`queued` one
/// idempotently. The heavy lifting is `TranscodingOrchestrator::queue`.
pub async fn retry_video(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let video = load_owned(&state, &user, &video_id).await?;
    let video = state.transcoding.queue(&video.id).await?;
    Ok(Json(video.into()))
}

#[derive(Deserialize)]
pub struct ListVideosQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ListVideosResponse {
    pub videos: Vec<VideoResponse>,
}

const DEFAULT_PAGE_SIZE: i64 = 25;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn list_videos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListVideosQuery>,
) -> ApiResult<Json<ListVideosResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(0).max(0);

    let status = query
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    let videos = state
        .videos
        .list_with_filters(None, status, None, Some(&user.uid), None, None, page, limit)
        .await
        .map_err(OrchestratorError::from)?;

    Ok(Json(ListVideosResponse {
        videos: videos.into_iter().map(VideoResponse::from).collect(),
    }))
}

fn parse_status(s: &str) -> ApiResult<VideoStatus> {
    match s {
        "pending" => Ok(VideoStatus::Pending),
        "queued" => Ok(VideoStatus::Queued),
        "processing" => Ok(VideoStatus::Processing),
        "ready" => Ok(VideoStatus::Ready),
        "failed" => Ok(VideoStatus::Failed),
        "dead_letter" => Ok(VideoStatus::DeadLetter),
        other => Err(ApiError::bad_request(format!("unknown status '{other}'"))),
    }
}
