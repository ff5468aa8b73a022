//! Reel handlers (§4.E): CRUD plus export triggering over
//! [`vclip_core::ReelOrchestrator`], scoped to the caller's own reels.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use vclip_core::OrchestratorError;
use vclip_models::{Composition, Reel, ReelId, Segment, VideoId};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

async fn load_owned(state: &AppState, user: &AuthUser, reel_id: &str) -> ApiResult<Reel> {
    let id = ReelId::from_string(reel_id);
    let reel = state.reels.get_by_id(&id).await.map_err(OrchestratorError::from)?;
    if reel.user_id != user.uid {
        return Err(ApiError::not_found("reel not found"));
    }
    Ok(reel)
}

#[derive(Deserialize)]
pub struct CreateReelRequest {
    pub video_id: String,
    pub title: String,
    pub segments: Vec<Segment>,
    pub composition: Composition,
}

pub async fn create_reel(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateReelRequest>,
) -> ApiResult<Json<Reel>> {
    let video_id = VideoId::from_string(body.video_id);
    let reel = state
        .reel_orchestrator
        .create(&video_id, &user.uid, &body.title, body.segments, body.composition)
        .await?;
    Ok(Json(reel))
}

pub async fn get_reel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reel_id): Path<String>,
) -> ApiResult<Json<Reel>> {
    let reel = load_owned(&state, &user, &reel_id).await?;
    Ok(Json(reel))
}

#[derive(Deserialize)]
pub struct UpdateReelRequest {
    pub title: String,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub cover_time: Option<f64>,
    pub composition: Composition,
}

pub async fn update_reel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reel_id): Path<String>,
    Json(body): Json<UpdateReelRequest>,
) -> ApiResult<Json<Reel>> {
    load_owned(&state, &user, &reel_id).await?;
    let id = ReelId::from_string(reel_id);
    let reel = state
        .reel_orchestrator
        .update(&id, &body.title, body.segments, body.cover_time, body.composition)
        .await?;
    Ok(Json(reel))
}

pub async fn export_reel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reel_id): Path<String>,
) -> ApiResult<Json<Reel>> {
    load_owned(&state, &user, &reel_id).await?;
    let id = ReelId::from_string(reel_id);
    let reel = state.reel_orchestrator.export(&id).await?;
    Ok(Json(reel))
}

pub async fn delete_reel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(reel_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    load_owned(&state, &user, &reel_id).await?;
    let id = ReelId::from_string(reel_id);
    state.reel_orchestrator.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
