//! Repository error types (§7): the subset of the error table raised at the
//! store layer. Orchestrators add `Conflict`/`QueueOverflow`/`BusUnavailable`
//! on top of these.

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found")]
    NotFound,

    #[error("invalid transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    pub fn invalid_state(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidState { from: from.into(), to: to.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
