//! Batch status polling: given a set of video ids, a single read instead of
//! N separate `get_video` calls.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vclip_models::VideoId;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_video_id;
use crate::state::AppState;

const MAX_STATUS_IDS: usize = 100;

#[derive(Deserialize)]
pub struct ProcessingStatusQuery {
    pub ids: Option<String>,
}

#[derive(Serialize)]
pub struct ProcessingStatusEntry {
    pub video_id: String,
    pub status: String,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Serialize)]
pub struct ProcessingStatusResponse {
    pub videos: Vec<ProcessingStatusEntry>,
}

pub async fn get_processing_status(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProcessingStatusQuery>,
) -> ApiResult<Json<ProcessingStatusResponse>> {
    let ids = parse_ids(&query.ids)?;
    validate_ids(&ids)?;

    info!(uid = %user.uid, ids_count = ids.len(), "get_processing_status");

    let mut videos = Vec::with_capacity(ids.len());
    for id in ids {
        let video_id = VideoId::from_string(id);
        match state.videos.get_by_id(&video_id).await {
            Ok(v) if v.user_id == user.uid => videos.push(ProcessingStatusEntry {
                video_id: v.id.as_str().to_string(),
                status: v.status.as_str().to_string(),
                retry_count: v.retry_count,
                last_error: v.last_error,
            }),
            // Missing or owned by someone else: silently skipped rather than
            // surfacing a per-id error in a batch response.
            _ => continue,
        }
    }

    Ok(Json(ProcessingStatusResponse { videos }))
}

fn parse_ids(ids_param: &Option<String>) -> ApiResult<Vec<String>> {
    let ids: Vec<String> = ids_param
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if ids.is_empty() {
        return Err(ApiError::bad_request("ids query param is required"));
    }
    if ids.len() > MAX_STATUS_IDS {
        return Err(ApiError::bad_request(format!("cannot query more than {} ids", MAX_STATUS_IDS)));
    }

    Ok(ids)
}

fn validate_ids(ids: &[String]) -> ApiResult<()> {
    for id in ids {
        if !is_valid_video_id(id) {
            return Err(ApiError::bad_request("invalid video id format"));
        }
    }
    Ok(())
}
