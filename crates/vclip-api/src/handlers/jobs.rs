//! Progress-history handlers (§4.K): event replay for a client reconnecting
//! mid-job. There is no current-status snapshot — only the live Pub/Sub
//! channel and the sorted-set replay buffer behind it.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vclip_core::OrchestratorError;
use vclip_models::ProgressEvent;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Replay events published since this timestamp (ms since epoch).
    #[serde(default)]
    pub since: Option<i64>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entity_id: String,
    pub events: Vec<ProgressEvent>,
}

/// GET /api/jobs/:entity_id/history — replay progress events for one
/// entity, scoped to the caller's own id so one user can't replay another's
/// job timeline.
pub async fn get_job_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entity_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let since = query.since.unwrap_or(0);
    info!(uid = %user.uid, entity_id = %entity_id, since, "get_job_history");

    let events = state.progress.history_since(&user.uid, &entity_id, since).await.map_err(OrchestratorError::from)?;

    Ok(Json(HistoryResponse { entity_id, events }))
}
