//! Cloudflare R2 blob client (§6): upload/download, presigned URLs,
//! prefix listing and deletion for the video/subtitle/reel/gallery blob
//! layout. No clip/highlight delivery or playback-URL surface — the job
//! orchestration plane does not serve blob bytes itself.

pub mod client;
pub mod error;

pub use client::R2Client;
pub use error::{StorageError, StorageResult};
