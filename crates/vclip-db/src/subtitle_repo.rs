//! Subtitle repository (§4.A, §4.D).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vclip_models::{SubtitleId, SubtitleStatus, SubtitleType, VideoId};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SubtitleRow {
    id: uuid::Uuid,
    video_id: uuid::Uuid,
    language: String,
    subtitle_type: String,
    source_language: Option<String>,
    status: String,
    srt_path: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
    processing_started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> DbResult<SubtitleStatus> {
    match s {
        "queued" => Ok(SubtitleStatus::Queued),
        "detecting" => Ok(SubtitleStatus::Detecting),
        "processing" => Ok(SubtitleStatus::Processing),
        "translating" => Ok(SubtitleStatus::Translating),
        "ready" => Ok(SubtitleStatus::Ready),
        "failed" => Ok(SubtitleStatus::Failed),
        other => Err(DbError::validation(format!("unknown subtitle status: {other}"))),
    }
}

fn parse_type(s: &str) -> SubtitleType {
    if s == "translated" {
        SubtitleType::Translated
    } else {
        SubtitleType::Original
    }
}

impl TryFrom<SubtitleRow> for vclip_models::Subtitle {
    type Error = DbError;

    fn try_from(row: SubtitleRow) -> Result<Self, Self::Error> {
        Ok(vclip_models::Subtitle {
            id: SubtitleId::from(row.id.to_string()),
            video_id: VideoId::from(row.video_id.to_string()),
            language: row.language,
            subtitle_type: parse_type(&row.subtitle_type),
            source_language: row.source_language,
            status: parse_status(&row.status)?,
            srt_path: row.srt_path,
            confidence: row.confidence,
            error: row.error,
            processing_started_at: row.processing_started_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn subtitle_id_uuid(id: &SubtitleId) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str()).map_err(|e| DbError::validation(e.to_string()))
}

fn video_id_uuid(id: &VideoId) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str()).map_err(|e| DbError::validation(e.to_string()))
}

const SELECT_COLUMNS: &str = "id, video_id, language, subtitle_type, source_language, status, srt_path, confidence, error, processing_started_at, created_at, updated_at";

pub struct SubtitleRepo {
    pool: PgPool,
}

impl SubtitleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, subtitle: &vclip_models::Subtitle) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subtitles (
                id, video_id, language, subtitle_type, source_language, status,
                srt_path, confidence, error, processing_started_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(subtitle_id_uuid(&subtitle.id)?)
        .bind(video_id_uuid(&subtitle.video_id)?)
        .bind(&subtitle.language)
        .bind(subtitle.subtitle_type.to_string())
        .bind(&subtitle.source_language)
        .bind(subtitle.status.as_str())
        .bind(&subtitle.srt_path)
        .bind(subtitle.confidence)
        .bind(&subtitle.error)
        .bind(subtitle.processing_started_at)
        .bind(subtitle.created_at)
        .bind(subtitle.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &SubtitleId) -> DbResult<vclip_models::Subtitle> {
        let row: SubtitleRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM subtitles WHERE id = $1"))
            .bind(subtitle_id_uuid(id)?)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    /// §3 Invariant 3: at most one `original` subtitle not in `failed`, and
    /// at most one non-`auto` per-language translated subtitle not in `failed`.
    pub async fn find_active_original(&self, video_id: &VideoId) -> DbResult<Option<vclip_models::Subtitle>> {
        let row: Option<SubtitleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subtitles WHERE video_id = $1 AND subtitle_type = 'original' AND status != 'failed' ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(video_id_uuid(video_id)?)
        .fetch_optional(&self.pool)
        .await?;

        row.map(vclip_models::Subtitle::try_from).transpose()
    }

    pub async fn find_active_translation(&self, video_id: &VideoId, language: &str) -> DbResult<Option<vclip_models::Subtitle>> {
        let row: Option<SubtitleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subtitles WHERE video_id = $1 AND subtitle_type = 'translated' AND language = $2 AND status != 'failed' ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(video_id_uuid(video_id)?)
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;

        row.map(vclip_models::Subtitle::try_from).transpose()
    }

    pub async fn list_by_video(&self, video_id: &VideoId) -> DbResult<Vec<vclip_models::Subtitle>> {
        let rows: Vec<SubtitleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subtitles WHERE video_id = $1 ORDER BY created_at ASC"
        ))
        .bind(video_id_uuid(video_id)?)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Subtitle::try_from).collect()
    }

    pub async fn get_by_status(&self, status: SubtitleStatus, offset: i64, limit: i64) -> DbResult<Vec<vclip_models::Subtitle>> {
        let rows: Vec<SubtitleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subtitles WHERE status = $1 ORDER BY created_at ASC OFFSET $2 LIMIT $3"
        ))
        .bind(status.as_str())
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Subtitle::try_from).collect()
    }

    /// Records in `{processing, translating, detecting}` older than the
    /// threshold (§4.H's third detector).
    pub async fn get_stuck_in_progress(&self, threshold_time: DateTime<Utc>) -> DbResult<Vec<vclip_models::Subtitle>> {
        let rows: Vec<SubtitleRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM subtitles WHERE status IN ('processing', 'translating', 'detecting') AND updated_at < $1"
        ))
        .bind(threshold_time)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Subtitle::try_from).collect()
    }

    /// Enforces the transition graph (§4.A, Invariant 1); serializes concurrent
    /// callbacks for the same entity via a row-level compare-and-set (§5).
    pub async fn update_status(&self, id: &SubtitleId, new_status: SubtitleStatus) -> DbResult<vclip_models::Subtitle> {
        let mut tx = self.pool.begin().await?;

        let current: SubtitleRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM subtitles WHERE id = $1 FOR UPDATE"))
            .bind(subtitle_id_uuid(id)?)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let current_status = parse_status(&current.status)?;
        if !current_status.can_transition_to(new_status) {
            return Err(DbError::invalid_state(current_status.as_str(), new_status.as_str()));
        }

        let stamps_start = matches!(new_status, SubtitleStatus::Detecting | SubtitleStatus::Processing | SubtitleStatus::Translating);

        sqlx::query(
            "UPDATE subtitles SET status = $2, processing_started_at = CASE WHEN $3 THEN now() ELSE processing_started_at END, updated_at = now() WHERE id = $1",
        )
        .bind(subtitle_id_uuid(id)?)
        .bind(new_status.as_str())
        .bind(stamps_start)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    pub async fn complete_ready(&self, id: &SubtitleId, srt_path: &str, language: Option<&str>) -> DbResult<vclip_models::Subtitle> {
        sqlx::query(
            "UPDATE subtitles SET status = 'ready', srt_path = $2, language = COALESCE($3, language), updated_at = now() WHERE id = $1",
        )
        .bind(subtitle_id_uuid(id)?)
        .bind(srt_path)
        .bind(language)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn mark_failed(&self, id: &SubtitleId, error: &str) -> DbResult<vclip_models::Subtitle> {
        sqlx::query(
            "UPDATE subtitles SET status = 'failed', error = $2, processing_started_at = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(subtitle_id_uuid(id)?)
        .bind(error)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn update_content(&self, id: &SubtitleId, srt_path: &str) -> DbResult<()> {
        sqlx::query("UPDATE subtitles SET srt_path = $2, updated_at = now() WHERE id = $1")
            .bind(subtitle_id_uuid(id)?)
            .bind(srt_path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &SubtitleId) -> DbResult<()> {
        sqlx::query("DELETE FROM subtitles WHERE id = $1")
            .bind(subtitle_id_uuid(id)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_by_video(&self, video_id: &VideoId) -> DbResult<()> {
        sqlx::query("DELETE FROM subtitles WHERE video_id = $1")
            .bind(video_id_uuid(video_id)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_status_string() {
        for s in ["queued", "detecting", "processing", "translating", "ready", "failed"] {
            assert!(parse_status(s).is_ok());
        }
    }
}
