//! Progress tracker payload (§4.K): ephemeral per-entity progress, keyed by
//! `(user_id, entity_id)`, coalesced at the publisher and delivered over a
//! transport the core does not specify.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub user_id: String,
    pub entity_id: String,
    pub phase: String,
    pub percent: u8,
    pub message: Option<String>,
    #[serde(default)]
    pub terminal: bool,
}

impl ProgressEvent {
    pub fn new(user_id: impl Into<String>, entity_id: impl Into<String>, phase: impl Into<String>, percent: u8) -> Self {
        Self {
            user_id: user_id.into(),
            entity_id: entity_id.into(),
            phase: phase.into(),
            percent: percent.min(100),
            message: None,
            terminal: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn key(&self) -> (String, String) {
        (self.user_id.clone(), self.entity_id.clone())
    }
}
