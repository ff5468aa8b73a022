//! Gallery handlers (§4.F): frame-extraction lifecycle plus admin
//! classification moves, over [`vclip_core::GalleryOrchestrator`].

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use vclip_core::OrchestratorError;
use vclip_models::VideoId;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_video_id;
use crate::state::AppState;

async fn owned_video_id(state: &AppState, user: &AuthUser, video_id: &str) -> ApiResult<VideoId> {
    if !is_valid_video_id(video_id) {
        return Err(ApiError::bad_request("invalid video id"));
    }
    let id = VideoId::from_string(video_id);
    let video = state.videos.get_by_id(&id).await.map_err(OrchestratorError::from)?;
    if video.user_id != user.uid {
        return Err(ApiError::not_found("video not found"));
    }
    Ok(id)
}

pub async fn generate_gallery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = owned_video_id(&state, &user, &video_id).await?;
    state.gallery_orchestrator.generate(&id).await?;
    Ok(Json(serde_json::json!({ "triggered": true })))
}

pub async fn regenerate_gallery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = owned_video_id(&state, &user, &video_id).await?;
    state.gallery_orchestrator.regenerate(&id).await?;
    Ok(Json(serde_json::json!({ "triggered": true })))
}

/// Admin approval: recounts safe/nsfw/source subprefixes and moves the
/// gallery to `ready`.
pub async fn publish_gallery(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = VideoId::from_string(video_id);
    state.gallery_orchestrator.publish_gallery(&id).await?;
    Ok(Json(serde_json::json!({ "published": true })))
}

#[derive(Deserialize)]
pub struct MoveImageRequest {
    pub code: String,
    pub filename: String,
    pub from: String,
    pub to: String,
}

pub async fn move_image(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<MoveImageRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.gallery_orchestrator.move_image(&body.code, &body.filename, &body.from, &body.to).await?;
    Ok(Json(serde_json::json!({ "moved": true })))
}

#[derive(Deserialize)]
pub struct MoveBatchRequest {
    pub code: String,
    pub filenames: Vec<String>,
    pub from: String,
    pub to: String,
}

pub async fn move_batch(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<MoveBatchRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let (succeeded, failed) = state.gallery_orchestrator.move_batch(&body.code, &body.filenames, &body.from, &body.to).await?;
    Ok(Json(serde_json::json!({ "succeeded": succeeded, "failed": failed })))
}
