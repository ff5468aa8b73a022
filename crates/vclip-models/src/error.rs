//! Validation errors raised by the domain types themselves, as opposed to
//! store- or bus-level errors raised by the crates that consume them.

use thiserror::Error;

use crate::reel::ReelValidationError;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    ReelValidation(#[from] ReelValidationError),

    #[error("invalid target language: {0}")]
    InvalidTargetLanguage(String),
}
