//! Request handlers.

pub mod admin;
pub mod callbacks;
pub mod gallery;
pub mod health;
pub mod jobs;
pub mod reels;
pub mod settings;
pub mod subtitles;
pub mod video_status;
pub mod videos;

pub use admin::*;
pub use callbacks::*;
pub use gallery::*;
pub use health::*;
pub use jobs::*;
pub use reels::*;
pub use settings::*;
pub use subtitles::*;
pub use video_status::*;
pub use videos::*;
