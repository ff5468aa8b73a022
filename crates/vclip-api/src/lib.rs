//! Axum HTTP API server: the thin edge over the job orchestration plane.
//!
//! Handlers resolve an identity, call into a `vclip-core` orchestrator, and
//! translate the result to HTTP. They hold no business logic of their own.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
