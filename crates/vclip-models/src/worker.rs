//! Worker heartbeat records (§4.B): workers periodically publish small
//! status records; the admin service exposes them read-only.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerType {
    Transcode,
    Subtitle,
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerType::Transcode => "transcode",
            WorkerType::Subtitle => "subtitle",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkerLifecycleStatus {
    #[default]
    Idle,
    Processing,
    Stopping,
    Paused,
}

impl fmt::Display for WorkerLifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerLifecycleStatus::Idle => "idle",
            WorkerLifecycleStatus::Processing => "processing",
            WorkerLifecycleStatus::Stopping => "stopping",
            WorkerLifecycleStatus::Paused => "paused",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerHeartbeat {
    pub worker_id: String,
    pub worker_type: WorkerType,
    /// The subject this worker is currently consuming, e.g. `transcode.jobs`.
    pub subject: String,
    pub status: WorkerLifecycleStatus,
    pub current_jobs: u32,
    pub reported_at: DateTime<Utc>,
}
