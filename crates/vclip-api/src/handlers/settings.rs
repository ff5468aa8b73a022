//! Settings handlers (§4.J): a read-everywhere, write-by-admin surface over
//! [`vclip_core::SettingsCache`].

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vclip_models::{Setting, SettingKey};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingResponse {
    pub category: String,
    pub key: String,
    pub value: String,
    pub locked: bool,
}

impl From<Setting> for SettingResponse {
    fn from(s: Setting) -> Self {
        Self {
            value: vclip_models::mask_if_secret(&s.value, s.is_secret),
            category: s.category,
            key: s.key,
            locked: s.locked,
        }
    }
}

pub async fn list_settings(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<SettingResponse>>> {
    let settings = SettingKey::ALL
        .into_iter()
        .filter_map(|k| state.settings.get(k))
        .map(SettingResponse::from)
        .collect();
    Ok(Json(settings))
}

#[derive(Deserialize)]
pub struct UpdateSettingRequest {
    pub category: String,
    pub key: String,
    pub value: String,
}

/// Admin write-through to the settings store. A locked (env-overridden) key
/// is a silent no-op per §4.J / §8 invariant 10 — the cache handles that.
pub async fn update_setting(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateSettingRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let key = SettingKey::from_category_key(&body.category, &body.key)
        .ok_or_else(|| ApiError::bad_request(format!("unknown setting {}.{}", body.category, body.key)))?;

    let entry = state.settings.write(key, &body.value, &user.uid).await?;

    Ok(Json(serde_json::json!({ "updated": entry.is_some() })))
}
