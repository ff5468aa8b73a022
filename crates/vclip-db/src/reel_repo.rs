//! Reel repository (§4.A, §4.E).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vclip_models::{Composition, ReelId, ReelStatus, Segment, VideoId};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ReelRow {
    id: uuid::Uuid,
    video_id: uuid::Uuid,
    user_id: String,
    title: String,
    segments: serde_json::Value,
    cover_time: Option<f64>,
    composition: serde_json::Value,
    status: String,
    export_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> DbResult<ReelStatus> {
    match s {
        "draft" => Ok(ReelStatus::Draft),
        "exporting" => Ok(ReelStatus::Exporting),
        "ready" => Ok(ReelStatus::Ready),
        "failed" => Ok(ReelStatus::Failed),
        other => Err(DbError::validation(format!("unknown reel status: {other}"))),
    }
}

impl TryFrom<ReelRow> for vclip_models::Reel {
    type Error = DbError;

    fn try_from(row: ReelRow) -> Result<Self, Self::Error> {
        let segments: Vec<Segment> = serde_json::from_value(row.segments)?;
        let composition: Composition = serde_json::from_value(row.composition)?;

        Ok(vclip_models::Reel {
            id: ReelId::from(row.id.to_string()),
            video_id: VideoId::from(row.video_id.to_string()),
            user_id: row.user_id,
            title: row.title,
            segments,
            cover_time: row.cover_time,
            composition,
            status: parse_status(&row.status)?,
            export_error: row.export_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn reel_id_uuid(id: &ReelId) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str()).map_err(|e| DbError::validation(e.to_string()))
}

fn video_id_uuid(id: &VideoId) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str()).map_err(|e| DbError::validation(e.to_string()))
}

const SELECT_COLUMNS: &str = "id, video_id, user_id, title, segments, cover_time, composition, status, export_error, created_at, updated_at";

pub struct ReelRepo {
    pool: PgPool,
}

impl ReelRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, reel: &vclip_models::Reel) -> DbResult<()> {
        let segments = serde_json::to_value(&reel.segments)?;
        let composition = serde_json::to_value(&reel.composition)?;

        sqlx::query(
            r#"
            INSERT INTO reels (id, video_id, user_id, title, segments, cover_time, composition, status, export_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(reel_id_uuid(&reel.id)?)
        .bind(video_id_uuid(&reel.video_id)?)
        .bind(&reel.user_id)
        .bind(&reel.title)
        .bind(segments)
        .bind(reel.cover_time)
        .bind(composition)
        .bind(reel.status.as_str())
        .bind(&reel.export_error)
        .bind(reel.created_at)
        .bind(reel.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &ReelId) -> DbResult<vclip_models::Reel> {
        let row: ReelRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM reels WHERE id = $1"))
            .bind(reel_id_uuid(id)?)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    pub async fn list_by_video(&self, video_id: &VideoId) -> DbResult<Vec<vclip_models::Reel>> {
        let rows: Vec<ReelRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM reels WHERE video_id = $1 ORDER BY created_at DESC"
        ))
        .bind(video_id_uuid(video_id)?)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Reel::try_from).collect()
    }

    pub async fn update_segments_and_composition(
        &self,
        id: &ReelId,
        segments: &[Segment],
        cover_time: Option<f64>,
        composition: &Composition,
        title: &str,
    ) -> DbResult<vclip_models::Reel> {
        let segments_json = serde_json::to_value(segments)?;
        let composition_json = serde_json::to_value(composition)?;

        sqlx::query(
            "UPDATE reels SET segments = $2, cover_time = $3, composition = $4, title = $5, updated_at = now() WHERE id = $1",
        )
        .bind(reel_id_uuid(id)?)
        .bind(segments_json)
        .bind(cover_time)
        .bind(composition_json)
        .bind(title)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Enforces §3 Invariant 5: `exporting` blocks update/delete at the
    /// caller (orchestrator) level; this method enforces the status
    /// transition itself via compare-and-set.
    pub async fn update_status(&self, id: &ReelId, new_status: ReelStatus) -> DbResult<vclip_models::Reel> {
        let current = self.get_by_id(id).await?;
        let allowed = match (current.status, new_status) {
            (ReelStatus::Draft, ReelStatus::Exporting) => true,
            (ReelStatus::Exporting, ReelStatus::Ready) => true,
            (ReelStatus::Exporting, ReelStatus::Failed) => true,
            (ReelStatus::Ready, ReelStatus::Exporting) => true,
            (ReelStatus::Failed, ReelStatus::Exporting) => true,
            _ => false,
        };
        if !allowed {
            return Err(DbError::invalid_state(current.status.as_str(), new_status.as_str()));
        }

        sqlx::query("UPDATE reels SET status = $2, updated_at = now() WHERE id = $1")
            .bind(reel_id_uuid(id)?)
            .bind(new_status.as_str())
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }

    pub async fn mark_failed(&self, id: &ReelId, error: &str) -> DbResult<vclip_models::Reel> {
        sqlx::query("UPDATE reels SET status = 'failed', export_error = $2, updated_at = now() WHERE id = $1")
            .bind(reel_id_uuid(id)?)
            .bind(error)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }

    pub async fn mark_ready(&self, id: &ReelId) -> DbResult<vclip_models::Reel> {
        sqlx::query("UPDATE reels SET status = 'ready', export_error = NULL, updated_at = now() WHERE id = $1")
            .bind(reel_id_uuid(id)?)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: &ReelId) -> DbResult<()> {
        sqlx::query("DELETE FROM reels WHERE id = $1")
            .bind(reel_id_uuid(id)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
