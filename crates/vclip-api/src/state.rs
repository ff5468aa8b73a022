//! Application state: one shared instance of every capability the handlers
//! need, built once at startup and cloned (cheaply, behind `Arc`) into each
//! request.

use std::sync::Arc;

use vclip_core::{
    AdminService, GalleryOrchestrator, ProgressReporter, ReelOrchestrator, SettingsCache,
    StuckDetectors, SubtitleOrchestrator, TranscodingOrchestrator, WarmCacheOrchestrator,
};
use vclip_db::{ReelRepo, SettingsRepo, SubtitleRepo, VideoRepo};
use vclip_queue::{JobBus, ProgressChannel, ProgressTracker};
use vclip_storage::R2Client;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,

    pub videos: Arc<VideoRepo>,
    pub subtitles: Arc<SubtitleRepo>,
    pub reels: Arc<ReelRepo>,

    pub storage: Arc<R2Client>,
    pub bus: Arc<JobBus>,
    pub progress: Arc<ProgressChannel>,

    pub settings: Arc<SettingsCache>,

    pub transcoding: Arc<TranscodingOrchestrator>,
    pub subtitle_orchestrator: Arc<SubtitleOrchestrator>,
    pub reel_orchestrator: Arc<ReelOrchestrator>,
    pub gallery_orchestrator: Arc<GalleryOrchestrator>,
    pub warmcache_orchestrator: Arc<WarmCacheOrchestrator>,
    pub admin: Arc<AdminService>,
    pub progress_reporter: Arc<ProgressReporter>,
    pub detectors: Arc<StuckDetectors>,
}

impl AppState {
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = vclip_db::connect_from_env().await?;
        vclip_db::run_migrations(&pool).await?;

        let videos = Arc::new(VideoRepo::new(pool.clone()));
        let subtitles = Arc::new(SubtitleRepo::new(pool.clone()));
        let reels = Arc::new(ReelRepo::new(pool.clone()));
        let settings_repo = SettingsRepo::new(pool.clone());

        let storage = Arc::new(R2Client::from_env().await?);

        let bus = Arc::new(JobBus::from_env()?);
        bus.init().await?;

        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let progress_channel = ProgressChannel::new(&redis_url)?;
        let progress = Arc::new(progress_channel.clone());
        let tracker = Arc::new(ProgressTracker::new(progress_channel));

        let settings = Arc::new(SettingsCache::new(settings_repo));
        settings.load().await?;

        let cleanup_original = std::env::var("TRANSCODING_CLEANUP_ORIGINAL")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        let transcoding = Arc::new(TranscodingOrchestrator::new(
            Arc::clone(&videos),
            Arc::clone(&bus),
            Arc::clone(&settings),
            cleanup_original,
        ));
        let subtitle_orchestrator = Arc::new(SubtitleOrchestrator::new(
            Arc::clone(&subtitles),
            Arc::clone(&videos),
            Arc::clone(&bus),
        ));
        let reel_orchestrator = Arc::new(ReelOrchestrator::new(
            Arc::clone(&reels),
            Arc::clone(&videos),
            Arc::clone(&bus),
            Arc::clone(&storage),
        ));
        let gallery_orchestrator = Arc::new(GalleryOrchestrator::new(
            Arc::clone(&videos),
            Arc::clone(&bus),
            Arc::clone(&storage),
        ));
        let warmcache_orchestrator = Arc::new(WarmCacheOrchestrator::new(Arc::clone(&videos), Arc::clone(&bus)));

        let admin = Arc::new(AdminService::new(
            Arc::clone(&videos),
            Arc::clone(&subtitles),
            Arc::clone(&bus),
            Arc::clone(&transcoding),
            Arc::clone(&subtitle_orchestrator),
        ));

        let progress_reporter = Arc::new(ProgressReporter::new(Arc::clone(&tracker)));
        let detectors = Arc::new(StuckDetectors::new(Arc::clone(&videos), Arc::clone(&subtitles)));

        Ok(Self {
            config,
            videos,
            subtitles,
            reels,
            storage,
            bus,
            progress,
            settings,
            transcoding,
            subtitle_orchestrator,
            reel_orchestrator,
            gallery_orchestrator,
            warmcache_orchestrator,
            admin,
            progress_reporter,
            detectors,
        })
    }
}
