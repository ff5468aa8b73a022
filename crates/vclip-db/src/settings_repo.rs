//! Settings repository (§3, §4.J): DB-backed overlay rows plus the
//! append-only audit log. Environment-variable locking and the in-memory
//! snapshot live in the settings cache above this layer, not here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vclip_models::{SettingValueType, SettingsAuditEntry};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct SettingRow {
    category: String,
    key: String,
    value: String,
    value_type: String,
    is_secret: bool,
    updated_at: DateTime<Utc>,
}

fn parse_value_type(s: &str) -> SettingValueType {
    match s {
        "integer" => SettingValueType::Integer,
        "boolean" => SettingValueType::Boolean,
        "list" => SettingValueType::List,
        _ => SettingValueType::String,
    }
}

fn value_type_str(t: SettingValueType) -> &'static str {
    match t {
        SettingValueType::String => "string",
        SettingValueType::Integer => "integer",
        SettingValueType::Boolean => "boolean",
        SettingValueType::List => "list",
    }
}

/// A raw DB row, pre-env-overlay (`locked` is decided by the caller).
pub struct StoredSetting {
    pub category: String,
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub is_secret: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingRow> for StoredSetting {
    fn from(row: SettingRow) -> Self {
        Self {
            category: row.category,
            key: row.key,
            value: row.value,
            value_type: parse_value_type(&row.value_type),
            is_secret: row.is_secret,
            updated_at: row.updated_at,
        }
    }
}

pub struct SettingsRepo {
    pool: PgPool,
}

impl SettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> DbResult<Vec<StoredSetting>> {
        let rows: Vec<SettingRow> = sqlx::query_as("SELECT category, key, value, value_type, is_secret, updated_at FROM settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(StoredSetting::from).collect())
    }

    pub async fn get(&self, category: &str, key: &str) -> DbResult<Option<StoredSetting>> {
        let row: Option<SettingRow> = sqlx::query_as(
            "SELECT category, key, value, value_type, is_secret, updated_at FROM settings WHERE category = $1 AND key = $2",
        )
        .bind(category)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredSetting::from))
    }

    /// Upsert one row and append an audit entry in the same transaction
    /// (§4.J: "Writes are upserts that also append an audit record").
    pub async fn upsert_with_audit(
        &self,
        category: &str,
        key: &str,
        value: &str,
        value_type: SettingValueType,
        is_secret: bool,
        changed_by: &str,
    ) -> DbResult<SettingsAuditEntry> {
        let mut tx = self.pool.begin().await?;

        let old_value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE category = $1 AND key = $2")
            .bind(category)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO settings (category, key, value, value_type, is_secret, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (category, key) DO UPDATE SET value = $3, value_type = $4, is_secret = $5, updated_at = now()
            "#,
        )
        .bind(category)
        .bind(key)
        .bind(value)
        .bind(value_type_str(value_type))
        .bind(is_secret)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO settings_audit_log (category, key, old_value, new_value, changed_at) VALUES ($1, $2, $3, $4, now())",
        )
        .bind(category)
        .bind(key)
        .bind(&old_value)
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SettingsAuditEntry {
            category: category.to_string(),
            key: key.to_string(),
            old_value,
            new_value: value.to_string(),
            changed_by: changed_by.to_string(),
            changed_at: Utc::now(),
        })
    }

    pub async fn audit_log(&self, category: &str, key: &str, limit: i64) -> DbResult<Vec<(Option<String>, String, DateTime<Utc>)>> {
        let rows: Vec<(Option<String>, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT old_value, new_value, changed_at FROM settings_audit_log WHERE category = $1 AND key = $2 ORDER BY changed_at DESC LIMIT $3",
        )
        .bind(category)
        .bind(key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
