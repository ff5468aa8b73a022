//! Orchestrator-layer error kinds (§7): the exhaustive set raised above the
//! store/bus/blob adapters. Orchestrators never swallow `NotFound`,
//! `InvalidState`, `Validation`, `Conflict`, `QueueOverflow` or
//! `StorageQuotaExceeded` — those always propagate to the caller.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("not found")]
    NotFound,

    #[error("invalid state: cannot move from {current} to {attempted}")]
    InvalidState { current: String, attempted: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("queue overflow: {pending} pending, limit {limit}")]
    QueueOverflow { pending: u64, limit: u64 },

    #[error("storage quota exceeded: {0}")]
    StorageQuotaExceeded(String),

    #[error("bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Db(String),

    #[error("bus error: {0}")]
    Queue(#[from] vclip_queue::QueueError),
}

impl OrchestratorError {
    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        Self::InvalidState { current: current.into(), attempted: attempted.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn queue_overflow(pending: u64, limit: u64) -> Self {
        Self::QueueOverflow { pending, limit }
    }
}

impl From<vclip_storage::StorageError> for OrchestratorError {
    fn from(e: vclip_storage::StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// `DbError::NotFound`/`InvalidState` carry orchestrator-visible meaning;
/// everything else is an opaque store failure.
impl From<vclip_db::DbError> for OrchestratorError {
    fn from(e: vclip_db::DbError) -> Self {
        match e {
            vclip_db::DbError::NotFound => Self::NotFound,
            vclip_db::DbError::InvalidState { from, to } => Self::invalid_state(from, to),
            vclip_db::DbError::Validation(msg) => Self::Validation(msg),
            other => Self::Db(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_not_found_maps_to_not_found() {
        assert!(matches!(OrchestratorError::from(vclip_db::DbError::NotFound), OrchestratorError::NotFound));
    }

    #[test]
    fn db_invalid_state_carries_transition_through() {
        let err = OrchestratorError::from(vclip_db::DbError::invalid_state("queued", "ready"));
        assert!(matches!(err, OrchestratorError::InvalidState { current, attempted } if current == "queued" && attempted == "ready"));
    }

    #[test]
    fn db_validation_maps_to_validation() {
        let err = OrchestratorError::from(vclip_db::DbError::validation("bad input"));
        assert!(matches!(err, OrchestratorError::Validation(msg) if msg == "bad input"));
    }

    #[test]
    fn opaque_db_errors_become_db_variant() {
        let err = OrchestratorError::from(vclip_db::DbError::Json(serde_json::from_str::<serde_json::Value>("{").unwrap_err()));
        assert!(matches!(err, OrchestratorError::Db(_)));
    }

    #[test]
    fn storage_errors_become_storage_variant() {
        let err = OrchestratorError::from(vclip_storage::StorageError::NotFound("videos/abc/original.mp4".to_string()));
        assert!(matches!(err, OrchestratorError::Storage(_)));
    }
}
