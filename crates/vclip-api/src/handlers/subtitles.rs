//! Subtitle handlers (§4.D): thin adapters over [`vclip_core::SubtitleOrchestrator`].
//! No transcription or translation happens here — only record lifecycle and
//! job triggering against videos the caller owns.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

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

pub async fn trigger_detect(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = owned_video_id(&state, &user, &video_id).await?;
    state.subtitle_orchestrator.trigger_detect(&id).await?;
    Ok(Json(serde_json::json!({ "triggered": true })))
}

#[derive(Serialize)]
pub struct SubtitleResponse {
    pub id: String,
    pub video_id: String,
    pub language: String,
    pub subtitle_type: String,
    pub status: String,
    pub srt_path: Option<String>,
}

impl From<vclip_models::Subtitle> for SubtitleResponse {
    fn from(s: vclip_models::Subtitle) -> Self {
        Self {
            id: s.id.as_str().to_string(),
            video_id: s.video_id.as_str().to_string(),
            language: s.language,
            subtitle_type: s.subtitle_type.to_string(),
            status: s.status.as_str().to_string(),
            srt_path: s.srt_path,
        }
    }
}

pub async fn trigger_transcribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
) -> ApiResult<Json<SubtitleResponse>> {
    let id = owned_video_id(&state, &user, &video_id).await?;
    let subtitle = state.subtitle_orchestrator.trigger_transcribe(&id).await?;
    Ok(Json(subtitle.into()))
}

#[derive(Deserialize)]
pub struct TranslateRequest {
    pub target_languages: Vec<String>,
}

#[derive(Serialize)]
pub struct TranslateResponse {
    pub created: Vec<String>,
    pub invalid_targets: Vec<String>,
    pub skipped_targets: Vec<String>,
}

pub async fn trigger_translate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(video_id): Path<String>,
    Json(body): Json<TranslateRequest>,
) -> ApiResult<Json<TranslateResponse>> {
    let id = owned_video_id(&state, &user, &video_id).await?;
    let outcome = state.subtitle_orchestrator.trigger_translate(&id, &body.target_languages).await?;
    Ok(Json(TranslateResponse {
        created: outcome.created.into_iter().map(|s| s.as_str().to_string()).collect(),
        invalid_targets: outcome.invalid_targets,
        skipped_targets: outcome.skipped_targets,
    }))
}

pub async fn get_content(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(subtitle_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = vclip_models::SubtitleId::from_string(subtitle_id);
    let srt_path = state.subtitle_orchestrator.content_get(&id).await?;
    Ok(Json(serde_json::json!({ "srt_path": srt_path })))
}

#[derive(Deserialize)]
pub struct UpdateContentRequest {
    pub srt_path: String,
}

pub async fn update_content(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(subtitle_id): Path<String>,
    Json(body): Json<UpdateContentRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = vclip_models::SubtitleId::from_string(subtitle_id);
    state.subtitle_orchestrator.content_update(&id, &body.srt_path).await?;
    Ok(Json(serde_json::json!({ "updated": true })))
}
