//! Video repository (§4.A): durable records, transition-graph enforcement,
//! and the stuck-query indexes consumed by §4.H's detectors.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vclip_models::{CategoryId, ErrorHistoryEntry, VideoCode, VideoId, VideoStatus};

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: uuid::Uuid,
    code: String,
    user_id: String,
    category_id: Option<uuid::Uuid>,
    title: String,
    description: Option<String>,
    original_path: Option<String>,
    status: String,
    retry_count: i32,
    last_error: Option<String>,
    error_history: serde_json::Value,
    processing_started_at: Option<DateTime<Utc>>,
    hls_path: Option<String>,
    hls_path_h264: Option<String>,
    audio_path: Option<String>,
    detected_language: Option<String>,
    duration: Option<f64>,
    quality: Option<String>,
    quality_sizes: serde_json::Value,
    disk_usage: i64,
    thumbnail_url: Option<String>,
    cache_status: String,
    cache_percentage: i32,
    cache_error: Option<String>,
    last_warmed_at: Option<DateTime<Utc>>,
    gallery_path: Option<String>,
    gallery_status: String,
    gallery_source_count: i32,
    gallery_count: i32,
    gallery_safe_count: i32,
    gallery_nsfw_count: i32,
    gallery_super_safe_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> DbResult<VideoStatus> {
    match s {
        "pending" => Ok(VideoStatus::Pending),
        "queued" => Ok(VideoStatus::Queued),
        "processing" => Ok(VideoStatus::Processing),
        "ready" => Ok(VideoStatus::Ready),
        "failed" => Ok(VideoStatus::Failed),
        "dead_letter" => Ok(VideoStatus::DeadLetter),
        other => Err(DbError::validation(format!("unknown video status: {other}"))),
    }
}

fn parse_cache_status(s: &str) -> vclip_models::CacheStatus {
    use vclip_models::CacheStatus::*;
    match s {
        "warming" => Warming,
        "cached" => Cached,
        "failed" => Failed,
        _ => Pending,
    }
}

fn parse_gallery_status(s: &str) -> vclip_models::GalleryStatus {
    use vclip_models::GalleryStatus::*;
    match s {
        "processing" => Processing,
        "pending_review" => PendingReview,
        "ready" => Ready,
        _ => None,
    }
}

impl TryFrom<VideoRow> for vclip_models::Video {
    type Error = DbError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let error_history: Vec<ErrorHistoryEntry> = serde_json::from_value(row.error_history)?;
        let quality_sizes: std::collections::HashMap<String, u64> = serde_json::from_value(row.quality_sizes)?;

        Ok(vclip_models::Video {
            id: VideoId::from(row.id.to_string()),
            code: VideoCode::from(row.code),
            user_id: row.user_id,
            category_id: row.category_id.map(|id| CategoryId::from(id.to_string())),
            title: row.title,
            description: row.description,
            original_path: row.original_path,
            status: parse_status(&row.status)?,
            retry_count: row.retry_count as u32,
            last_error: row.last_error,
            error_history,
            processing_started_at: row.processing_started_at,
            hls_path: row.hls_path,
            hls_path_h264: row.hls_path_h264,
            audio_path: row.audio_path,
            detected_language: row.detected_language,
            duration: row.duration,
            quality: row.quality,
            quality_sizes,
            disk_usage: row.disk_usage as u64,
            thumbnail_url: row.thumbnail_url,
            cache_status: parse_cache_status(&row.cache_status),
            cache_percentage: row.cache_percentage as u32,
            cache_error: row.cache_error,
            last_warmed_at: row.last_warmed_at,
            gallery_path: row.gallery_path,
            gallery_status: parse_gallery_status(&row.gallery_status),
            gallery_source_count: row.gallery_source_count as u32,
            gallery_count: row.gallery_count as u32,
            gallery_safe_count: row.gallery_safe_count as u32,
            gallery_nsfw_count: row.gallery_nsfw_count as u32,
            gallery_super_safe_count: row.gallery_super_safe_count as u32,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn video_id_uuid(id: &VideoId) -> DbResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id.as_str()).map_err(|e| DbError::validation(e.to_string()))
}

pub struct VideoRepo {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = r#"
    id, code, user_id, category_id, title, description, original_path,
    status, retry_count, last_error, error_history, processing_started_at,
    hls_path, hls_path_h264, audio_path, detected_language, duration, quality,
    quality_sizes, disk_usage, thumbnail_url,
    cache_status, cache_percentage, cache_error, last_warmed_at,
    gallery_path, gallery_status, gallery_source_count, gallery_count,
    gallery_safe_count, gallery_nsfw_count, gallery_super_safe_count,
    created_at, updated_at
"#;

impl VideoRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, video: &vclip_models::Video) -> DbResult<()> {
        let error_history = serde_json::to_value(&video.error_history)?;
        let quality_sizes = serde_json::to_value(&video.quality_sizes)?;

        sqlx::query(
            r#"
            INSERT INTO videos (
                id, code, user_id, category_id, title, description, original_path,
                status, retry_count, last_error, error_history, processing_started_at,
                hls_path, hls_path_h264, audio_path, detected_language, duration, quality,
                quality_sizes, disk_usage, thumbnail_url,
                cache_status, cache_percentage, cache_error, last_warmed_at,
                gallery_path, gallery_status, gallery_source_count, gallery_count,
                gallery_safe_count, gallery_nsfw_count, gallery_super_safe_count,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34
            )
            "#,
        )
        .bind(video_id_uuid(&video.id)?)
        .bind(video.code.as_str())
        .bind(&video.user_id)
        .bind(video.category_id.as_ref().map(|c| uuid::Uuid::parse_str(c.as_str())).transpose().map_err(|e| DbError::validation(e.to_string()))?)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.original_path)
        .bind(video.status.as_str())
        .bind(video.retry_count as i32)
        .bind(&video.last_error)
        .bind(error_history)
        .bind(video.processing_started_at)
        .bind(&video.hls_path)
        .bind(&video.hls_path_h264)
        .bind(&video.audio_path)
        .bind(&video.detected_language)
        .bind(video.duration)
        .bind(&video.quality)
        .bind(quality_sizes)
        .bind(video.disk_usage as i64)
        .bind(&video.thumbnail_url)
        .bind(video.cache_status.as_str())
        .bind(video.cache_percentage as i32)
        .bind(&video.cache_error)
        .bind(video.last_warmed_at)
        .bind(&video.gallery_path)
        .bind(video.gallery_status.as_str())
        .bind(video.gallery_source_count as i32)
        .bind(video.gallery_count as i32)
        .bind(video.gallery_safe_count as i32)
        .bind(video.gallery_nsfw_count as i32)
        .bind(video.gallery_super_safe_count as i32)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &VideoId) -> DbResult<vclip_models::Video> {
        let row: VideoRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM videos WHERE id = $1"))
            .bind(video_id_uuid(id)?)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<vclip_models::Video> {
        let row: VideoRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM videos WHERE code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)?;
        row.try_into()
    }

    pub async fn get_by_status(&self, status: VideoStatus, offset: i64, limit: i64) -> DbResult<Vec<vclip_models::Video>> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos WHERE status = $1 ORDER BY created_at ASC OFFSET $2 LIMIT $3"
        ))
        .bind(status.as_str())
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Video::try_from).collect()
    }

    pub async fn count_by_status(&self, status: VideoStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// `list_with_filters(search, status, category, user, date-range, sort, page, limit)` (§4.A).
    #[allow(clippy::too_many_arguments)]
    pub async fn list_with_filters(
        &self,
        search: Option<&str>,
        status: Option<VideoStatus>,
        category_id: Option<&CategoryId>,
        user_id: Option<&str>,
        created_after: Option<DateTime<Utc>>,
        created_before: Option<DateTime<Utc>>,
        page: i64,
        limit: i64,
    ) -> DbResult<Vec<vclip_models::Video>> {
        let category_uuid = category_id
            .map(|c| uuid::Uuid::parse_str(c.as_str()))
            .transpose()
            .map_err(|e| DbError::validation(e.to_string()))?;

        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM videos
            WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::text IS NULL OR user_id = $4)
              AND ($5::timestamptz IS NULL OR created_at >= $5)
              AND ($6::timestamptz IS NULL OR created_at <= $6)
            ORDER BY created_at DESC
            OFFSET $7 LIMIT $8
            "#
        ))
        .bind(search)
        .bind(status.map(|s| s.as_str().to_string()))
        .bind(category_uuid)
        .bind(user_id)
        .bind(created_after)
        .bind(created_before)
        .bind(page.max(0) * limit)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Video::try_from).collect()
    }

    /// Records whose `processing_started_at < threshold_time` and whose
    /// status is in the processing family (§4.A, §4.H).
    pub async fn get_stuck_processing(&self, threshold_time: DateTime<Utc>) -> DbResult<Vec<vclip_models::Video>> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos WHERE status = 'processing' AND processing_started_at < $1"
        ))
        .bind(threshold_time)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Video::try_from).collect()
    }

    /// Records in the given status whose `updated_at < threshold_time` (§4.A, §4.H).
    pub async fn get_stuck_by_status(&self, status: VideoStatus, threshold_time: DateTime<Utc>) -> DbResult<Vec<vclip_models::Video>> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos WHERE status = $1 AND updated_at < $2"
        ))
        .bind(status.as_str())
        .bind(threshold_time)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(vclip_models::Video::try_from).collect()
    }

    /// Enforces the transition graph (§4.A, Invariant 1); serializes concurrent
    /// callbacks for the same entity via a row-level compare-and-set (§5).
    pub async fn update_status(&self, id: &VideoId, new_status: VideoStatus) -> DbResult<vclip_models::Video> {
        let mut tx = self.pool.begin().await?;

        let current: VideoRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"))
            .bind(video_id_uuid(id)?)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let current_status = parse_status(&current.status)?;
        if !current_status.can_transition_to(new_status) {
            return Err(DbError::invalid_state(current_status.as_str(), new_status.as_str()));
        }

        let stamps_processing_started = matches!(
            new_status,
            VideoStatus::Processing
        );

        sqlx::query(
            "UPDATE videos SET status = $2, processing_started_at = CASE WHEN $3 THEN now() ELSE processing_started_at END, updated_at = now() WHERE id = $1",
        )
        .bind(video_id_uuid(id)?)
        .bind(new_status.as_str())
        .bind(stamps_processing_started)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// `mark_failed(id, error)` (§4.A): sets `failed` (or `dead_letter` at the
    /// retry ceiling), appends `error_history`, increments `retry_count`,
    /// clears `processing_started_at`.
    pub async fn mark_failed(&self, id: &VideoId, error: &str, retry_ceiling: u32) -> DbResult<vclip_models::Video> {
        let mut tx = self.pool.begin().await?;

        let current: VideoRow = sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"))
            .bind(video_id_uuid(id)?)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let mut video = vclip_models::Video::try_from(current)?;
        let next_retry_count = video.retry_count + 1;
        let next_status = if next_retry_count >= retry_ceiling {
            VideoStatus::DeadLetter
        } else {
            VideoStatus::Failed
        };

        video.error_history.push(ErrorHistoryEntry::new(next_retry_count, error, video.status.as_str()));
        let error_history = serde_json::to_value(&video.error_history)?;

        sqlx::query(
            r#"
            UPDATE videos SET
                status = $2, retry_count = $3, last_error = $4, error_history = $5,
                processing_started_at = NULL, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(video_id_uuid(id)?)
        .bind(next_status.as_str())
        .bind(next_retry_count as i32)
        .bind(error)
        .bind(error_history)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// `reset_for_retry(id)` (§4.A): zeroes `retry_count`/`last_error`, moves to `pending`.
    pub async fn reset_for_retry(&self, id: &VideoId) -> DbResult<vclip_models::Video> {
        sqlx::query(
            "UPDATE videos SET status = 'pending', retry_count = 0, last_error = NULL, processing_started_at = NULL, updated_at = now() WHERE id = $1",
        )
        .bind(video_id_uuid(id)?)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn update_hls_output(
        &self,
        id: &VideoId,
        hls_path: &str,
        hls_path_h264: Option<&str>,
        duration: f64,
        quality: &str,
        disk_usage: u64,
        quality_sizes: &std::collections::HashMap<String, u64>,
        thumbnail_url: Option<&str>,
    ) -> DbResult<vclip_models::Video> {
        let quality_sizes_json = serde_json::to_value(quality_sizes)?;

        sqlx::query(
            r#"
            UPDATE videos SET
                status = 'ready', hls_path = $2, hls_path_h264 = $3, duration = $4, quality = $5,
                disk_usage = $6, quality_sizes = $7, thumbnail_url = $8, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(video_id_uuid(id)?)
        .bind(hls_path)
        .bind(hls_path_h264)
        .bind(duration)
        .bind(quality)
        .bind(disk_usage as i64)
        .bind(quality_sizes_json)
        .bind(thumbnail_url)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    pub async fn clear_original_path(&self, id: &VideoId) -> DbResult<()> {
        sqlx::query("UPDATE videos SET original_path = NULL, updated_at = now() WHERE id = $1")
            .bind(video_id_uuid(id)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_detected_language(&self, id: &VideoId, language: &str) -> DbResult<()> {
        sqlx::query("UPDATE videos SET detected_language = $2, updated_at = now() WHERE id = $1")
            .bind(video_id_uuid(id)?)
            .bind(language)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_cache_status(&self, id: &VideoId, status: vclip_models::CacheStatus) -> DbResult<()> {
        sqlx::query("UPDATE videos SET cache_status = $2, updated_at = now() WHERE id = $1")
            .bind(video_id_uuid(id)?)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_gallery_status(&self, id: &VideoId, status: vclip_models::GalleryStatus) -> DbResult<()> {
        sqlx::query("UPDATE videos SET gallery_status = $2, updated_at = now() WHERE id = $1")
            .bind(video_id_uuid(id)?)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_gallery_counts(
        &self,
        id: &VideoId,
        gallery_path: Option<&str>,
        source_count: u32,
        count: u32,
        safe_count: u32,
        nsfw_count: u32,
        super_safe_count: u32,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE videos SET
                gallery_path = COALESCE($2, gallery_path),
                gallery_source_count = $3, gallery_count = $4,
                gallery_safe_count = $5, gallery_nsfw_count = $6, gallery_super_safe_count = $7,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(video_id_uuid(id)?)
        .bind(gallery_path)
        .bind(source_count as i32)
        .bind(count as i32)
        .bind(safe_count as i32)
        .bind(nsfw_count as i32)
        .bind(super_safe_count as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &VideoId) -> DbResult<()> {
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id_uuid(id)?)
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
        for s in ["pending", "queued", "processing", "ready", "failed", "dead_letter"] {
            assert!(parse_status(s).is_ok());
        }
        assert!(parse_status("bogus").is_err());
    }
}
