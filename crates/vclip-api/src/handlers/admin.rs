//! Admin handlers (§4.I): queue introspection and bulk retry/clear
//! operations over the entity store and job bus.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vclip_models::{Subtitle, VideoId};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::videos::VideoResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct QueueDepthResponse {
    pub subject: String,
    pub depth: u64,
    pub dlq_depth: u64,
}

pub async fn queue_status(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<QueueDepthResponse>>> {
    let stats = state.admin.queue_stats().await?;
    Ok(Json(
        stats
            .into_iter()
            .map(|q| QueueDepthResponse { subject: q.subject.as_str().to_string(), depth: q.depth, dlq_depth: q.dlq_depth })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn page_limit(q: &PageQuery) -> (i64, i64) {
    (q.page.unwrap_or(0).max(0), q.limit.unwrap_or(25).clamp(1, 100))
}

pub async fn failed_videos(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    let (page, limit) = page_limit(&query);
    let videos = state.admin.get_failed_videos(page, limit).await?;
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

pub async fn stuck_videos(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<VideoResponse>>> {
    let (page, limit) = page_limit(&query);
    let videos = state.admin.get_stuck_videos(page, limit).await?;
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

pub async fn retry_video(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let video = state.admin.retry_one_video(&VideoId::from_string(video_id)).await?;
    Ok(Json(video.into()))
}

#[derive(Serialize)]
pub struct RetryAllResponse {
    pub retried: u32,
    pub errored: u32,
}

pub async fn retry_all_videos(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<RetryAllResponse>> {
    let (retried, errored) = state.admin.retry_all_videos().await?;
    Ok(Json(RetryAllResponse { retried, errored }))
}

#[derive(Serialize)]
pub struct SubtitleSummary {
    pub id: String,
    pub video_id: String,
    pub subtitle_type: String,
    pub language: String,
    pub status: String,
    pub error: Option<String>,
}

impl From<Subtitle> for SubtitleSummary {
    fn from(s: Subtitle) -> Self {
        Self {
            id: s.id.as_str().to_string(),
            video_id: s.video_id.as_str().to_string(),
            subtitle_type: s.subtitle_type.to_string(),
            language: s.language,
            status: s.status.as_str().to_string(),
            error: s.error,
        }
    }
}

pub async fn failed_subtitles(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<SubtitleSummary>>> {
    let (page, limit) = page_limit(&query);
    let subtitles = state.admin.get_failed_subtitles(page, limit).await?;
    Ok(Json(subtitles.into_iter().map(SubtitleSummary::from).collect()))
}

pub async fn stuck_subtitles(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<SubtitleSummary>>> {
    let (page, limit) = page_limit(&query);
    let subtitles = state.admin.get_stuck_subtitles(page, limit).await?;
    Ok(Json(subtitles.into_iter().map(SubtitleSummary::from).collect()))
}

#[derive(Serialize)]
pub struct ClearAllResponse {
    pub purged: u64,
    pub deleted: u32,
}

pub async fn clear_all_subtitles(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<ClearAllResponse>> {
    let (purged, deleted) = state.admin.clear_all_subtitles().await?;
    Ok(Json(ClearAllResponse { purged, deleted }))
}

#[derive(Serialize)]
pub struct QueueMissingResponse {
    pub queued: u32,
    pub skipped: u32,
}

pub async fn queue_missing_subtitles(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<QueueMissingResponse>> {
    let (queued, skipped) = state.admin.queue_missing_subtitles().await?;
    Ok(Json(QueueMissingResponse { queued, skipped }))
}
