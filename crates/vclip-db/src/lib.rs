//! Postgres-backed entity store (§3, §4.A) for the video job orchestration
//! plane: one repository per entity, plus the settings/audit lookup table.
//! Every status transition that must be serialized against concurrent
//! worker callbacks goes through a row lock inside a transaction, never a
//! bare UPDATE.

pub mod error;
pub mod pool;
pub mod reel_repo;
pub mod settings_repo;
pub mod subtitle_repo;
pub mod video_repo;

pub use error::{DbError, DbResult};
pub use pool::{connect, connect_from_env, run_migrations};
pub use reel_repo::ReelRepo;
pub use settings_repo::{SettingsRepo, StoredSetting};
pub use subtitle_repo::SubtitleRepo;
pub use video_repo::VideoRepo;
