//! Runtime-tunable settings (§3, §4.J): a `(category, key)` map with
//! environment overrides that lock a key against admin writes.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed set of recognized settings (§4.J table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SettingKey {
    TranscodingDefaultQualities,
    TranscodingAutoQueue,
    TranscodingMaxQueueSize,
    GeneralMaxUploadSize,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::TranscodingDefaultQualities,
        SettingKey::TranscodingAutoQueue,
        SettingKey::TranscodingMaxQueueSize,
        SettingKey::GeneralMaxUploadSize,
    ];

    pub fn category(&self) -> &'static str {
        match self {
            SettingKey::TranscodingDefaultQualities
            | SettingKey::TranscodingAutoQueue
            | SettingKey::TranscodingMaxQueueSize => "transcoding",
            SettingKey::GeneralMaxUploadSize => "general",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SettingKey::TranscodingDefaultQualities => "default_qualities",
            SettingKey::TranscodingAutoQueue => "auto_queue",
            SettingKey::TranscodingMaxQueueSize => "max_queue_size",
            SettingKey::GeneralMaxUploadSize => "max_upload_size",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            SettingKey::TranscodingDefaultQualities => "SETTING_TRANSCODING_DEFAULT_QUALITIES",
            SettingKey::TranscodingAutoQueue => "SETTING_TRANSCODING_AUTO_QUEUE",
            SettingKey::TranscodingMaxQueueSize => "SETTING_TRANSCODING_MAX_QUEUE_SIZE",
            SettingKey::GeneralMaxUploadSize => "SETTING_GENERAL_MAX_UPLOAD_SIZE",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            SettingKey::TranscodingDefaultQualities => "1080p,720p,480p",
            SettingKey::TranscodingAutoQueue => "true",
            SettingKey::TranscodingMaxQueueSize => "0",
            SettingKey::GeneralMaxUploadSize => "20",
        }
    }

    pub fn is_secret(&self) -> bool {
        false
    }

    pub fn from_category_key(category: &str, key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.category() == category && k.key() == key)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category(), self.key())
    }
}

/// A loaded `(category, key)` row (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Setting {
    pub category: String,
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub is_secret: bool,
    /// True when an environment variable overlays (and locks) this key.
    pub locked: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
    List,
}

/// Append-only audit record for a settings write (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SettingsAuditEntry {
    pub category: String,
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

/// Mask a secret value the way audit log display must (§4.J: "secret values masked").
pub fn mask_if_secret(value: &str, is_secret: bool) -> String {
    if is_secret {
        "*".repeat(value.len().min(8))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_category_and_key() {
        let k = SettingKey::from_category_key("transcoding", "max_queue_size").unwrap();
        assert_eq!(k, SettingKey::TranscodingMaxQueueSize);
        assert!(SettingKey::from_category_key("bogus", "nope").is_none());
    }

    #[test]
    fn secret_values_are_masked() {
        assert_eq!(mask_if_secret("hunter2", true), "*******");
        assert_eq!(mask_if_secret("hunter2", false), "hunter2");
    }
}
