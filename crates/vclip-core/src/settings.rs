//! Settings cache (§4.J): an in-memory snapshot of `(category, key)` values,
//! loaded at startup as defaults overlaid by DB rows overlaid by
//! environment variables. Environment overlays lock a key against writes.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use vclip_db::SettingsRepo;
use vclip_models::{mask_if_secret, Setting, SettingKey, SettingValueType, SettingsAuditEntry};

use crate::error::{OrchestratorError, OrchestratorResult};

/// One process-wide value, explicitly initialized and explicitly
/// invalidated — no global singleton (§9 design note).
pub struct SettingsCache {
    repo: SettingsRepo,
    snapshot: RwLock<HashMap<(String, String), Setting>>,
}

impl SettingsCache {
    pub fn new(repo: SettingsRepo) -> Self {
        Self { repo, snapshot: RwLock::new(HashMap::new()) }
    }

    /// Build the overlay: defaults < DB rows < environment variables.
    pub async fn load(&self) -> OrchestratorResult<()> {
        let mut map = HashMap::new();

        for key in SettingKey::ALL {
            map.insert(
                (key.category().to_string(), key.key().to_string()),
                Setting {
                    category: key.category().to_string(),
                    key: key.key().to_string(),
                    value: key.default_value().to_string(),
                    value_type: SettingValueType::String,
                    is_secret: key.is_secret(),
                    locked: false,
                    updated_at: Utc::now(),
                },
            );
        }

        for row in self.repo.get_all().await.map_err(OrchestratorError::from)? {
            map.insert(
                (row.category.clone(), row.key.clone()),
                Setting {
                    category: row.category,
                    key: row.key,
                    value: row.value,
                    value_type: row.value_type,
                    is_secret: row.is_secret,
                    locked: false,
                    updated_at: row.updated_at,
                },
            );
        }

        for key in SettingKey::ALL {
            if let Ok(value) = std::env::var(key.env_var()) {
                map.insert(
                    (key.category().to_string(), key.key().to_string()),
                    Setting {
                        category: key.category().to_string(),
                        key: key.key().to_string(),
                        value,
                        value_type: SettingValueType::String,
                        is_secret: key.is_secret(),
                        locked: true,
                        updated_at: Utc::now(),
                    },
                );
            }
        }

        *self.snapshot.write().expect("settings snapshot lock poisoned") = map;
        Ok(())
    }

    pub fn get(&self, key: SettingKey) -> Option<Setting> {
        self.snapshot.read().expect("settings snapshot lock poisoned").get(&(key.category().to_string(), key.key().to_string())).cloned()
    }

    pub fn get_str(&self, key: SettingKey) -> String {
        self.get(key).map(|s| s.value).unwrap_or_else(|| key.default_value().to_string())
    }

    pub fn get_u64(&self, key: SettingKey) -> u64 {
        self.get_str(key).parse().unwrap_or(0)
    }

    pub fn get_bool(&self, key: SettingKey) -> bool {
        matches!(self.get_str(key).as_str(), "true" | "1")
    }

    pub fn qualities(&self) -> Vec<String> {
        self.get_str(SettingKey::TranscodingDefaultQualities)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn max_queue_size(&self) -> u64 {
        self.get_u64(SettingKey::TranscodingMaxQueueSize)
    }

    pub fn auto_queue(&self) -> bool {
        self.get_bool(SettingKey::TranscodingAutoQueue)
    }

    /// Upsert a value through the DB, append an audit record, and refresh
    /// the in-memory snapshot for just that key's category.
    ///
    /// A locked key (env override present) is a silent success: the write
    /// returns `Ok` with no change and no audit entry (§8 invariant 10).
    pub async fn write(&self, key: SettingKey, value: &str, changed_by: &str) -> OrchestratorResult<Option<SettingsAuditEntry>> {
        if self.get(key).map(|s| s.locked).unwrap_or(false) {
            return Ok(None);
        }

        let entry = self
            .repo
            .upsert_with_audit(key.category(), key.key(), value, SettingValueType::String, key.is_secret(), changed_by)
            .await
            .map_err(OrchestratorError::from)?;

        self.invalidate_category(key.category()).await?;

        Ok(Some(entry))
    }

    /// Reload every key in one category from the DB (defaults/env unaffected).
    async fn invalidate_category(&self, category: &str) -> OrchestratorResult<()> {
        for row in self.repo.get_all().await.map_err(OrchestratorError::from)? {
            if row.category != category {
                continue;
            }
            let locked = std::env::var(format!("SETTING_{}_{}", row.category.to_uppercase(), row.key.to_uppercase())).is_ok();
            if locked {
                continue;
            }
            self.snapshot.write().expect("settings snapshot lock poisoned").insert(
                (row.category.clone(), row.key.clone()),
                Setting {
                    category: row.category,
                    key: row.key,
                    value: row.value,
                    value_type: row.value_type,
                    is_secret: row.is_secret,
                    locked: false,
                    updated_at: row.updated_at,
                },
            );
        }
        Ok(())
    }

    pub fn masked_value(&self, key: SettingKey) -> String {
        let setting = self.get(key);
        match setting {
            Some(s) => mask_if_secret(&s.value, s.is_secret),
            None => key.default_value().to_string(),
        }
    }
}
