//! API routes.

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::{admin, callbacks, gallery, health as health_handlers, jobs, reels, settings, subtitles, video_status, videos};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let video_routes = Router::new()
        .route("/videos", get(videos::list_videos).post(videos::create_video))
        .route("/videos/status", get(video_status::get_processing_status))
        .route("/videos/:video_id", get(videos::get_video))
        .route("/videos/:video_id", axum::routing::delete(videos::delete_video))
        .route("/videos/:video_id/retry", post(videos::retry_video));

    let subtitle_routes = Router::new()
        .route("/videos/:video_id/subtitles/detect", post(subtitles::trigger_detect))
        .route("/videos/:video_id/subtitles/transcribe", post(subtitles::trigger_transcribe))
        .route("/videos/:video_id/subtitles/translate", post(subtitles::trigger_translate))
        .route("/subtitles/:subtitle_id/content", get(subtitles::get_content))
        .route("/subtitles/:subtitle_id/content", patch(subtitles::update_content));

    let reel_routes = Router::new()
        .route("/reels", post(reels::create_reel))
        .route("/reels/:reel_id", get(reels::get_reel))
        .route("/reels/:reel_id", patch(reels::update_reel))
        .route("/reels/:reel_id", axum::routing::delete(reels::delete_reel))
        .route("/reels/:reel_id/export", post(reels::export_reel));

    let gallery_routes = Router::new()
        .route("/videos/:video_id/gallery/generate", post(gallery::generate_gallery))
        .route("/videos/:video_id/gallery/regenerate", post(gallery::regenerate_gallery))
        .route("/videos/:video_id/gallery/publish", post(gallery::publish_gallery))
        .route("/gallery/move", post(gallery::move_image))
        .route("/gallery/move-batch", post(gallery::move_batch));

    let jobs_routes = Router::new().route("/jobs/:entity_id/history", get(jobs::get_job_history));

    let settings_routes = Router::new()
        .route("/settings", get(settings::list_settings))
        .route("/settings", post(settings::update_setting));

    let admin_routes = Router::new()
        .route("/admin/queue/status", get(admin::queue_status))
        .route("/admin/videos/failed", get(admin::failed_videos))
        .route("/admin/videos/stuck", get(admin::stuck_videos))
        .route("/admin/videos/:video_id/retry", post(admin::retry_video))
        .route("/admin/videos/retry-all", post(admin::retry_all_videos))
        .route("/admin/subtitles/failed", get(admin::failed_subtitles))
        .route("/admin/subtitles/stuck", get(admin::stuck_subtitles))
        .route("/admin/subtitles/clear-all", post(admin::clear_all_subtitles))
        .route("/admin/subtitles/queue-missing", post(admin::queue_missing_subtitles));

    // Worker-side callbacks: not user-identity scoped, authenticated at the
    // network boundary rather than per-request.
    let callback_routes = Router::new()
        .route("/callbacks/transcode/started", post(callbacks::transcode_started))
        .route("/callbacks/transcode/complete", post(callbacks::transcode_complete))
        .route("/callbacks/transcode/failed", post(callbacks::transcode_failed))
        .route("/callbacks/subtitles/started", post(callbacks::subtitle_job_started))
        .route("/callbacks/subtitles/detect-complete", post(callbacks::subtitle_detect_complete))
        .route("/callbacks/subtitles/transcribe-complete", post(callbacks::subtitle_transcribe_complete))
        .route("/callbacks/subtitles/translate-complete", post(callbacks::subtitle_translate_complete))
        .route("/callbacks/subtitles/failed", post(callbacks::subtitle_failed))
        .route("/callbacks/reels/export-complete", post(callbacks::reel_export_complete))
        .route("/callbacks/reels/export-failed", post(callbacks::reel_export_failed))
        .route("/callbacks/gallery/update", post(callbacks::gallery_update))
        .route("/callbacks/warmcache/complete", post(callbacks::warmcache_complete))
        .route("/callbacks/warmcache/failed", post(callbacks::warmcache_failed));

    // Create rate limiter for API routes
    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(video_routes)
        .merge(subtitle_routes)
        .merge(reel_routes)
        .merge(gallery_routes)
        .merge(jobs_routes)
        .merge(settings_routes)
        .merge(admin_routes)
        .merge(callback_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health_handlers::health))
        .route("/healthz", get(health_handlers::health))
        .route("/ready", get(health_handlers::ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
