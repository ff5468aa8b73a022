//! Worker heartbeat registry (§4.B, §3 supplement): a read-only,
//! admin-visible record of which worker processes are alive and what
//! subject they are consuming. Workers publish their own heartbeat;
//! nothing else writes to this registry.

use redis::AsyncCommands;
use vclip_models::worker::{WorkerHeartbeat, WorkerLifecycleStatus, WorkerType};

use crate::error::QueueResult;
use crate::subject::Subject;

const HEARTBEAT_TTL_SECS: u64 = 30;
const REGISTRY_KEY: &str = "vclip:workers:registry";

pub struct HeartbeatRegistry {
    client: redis::Client,
}

impl HeartbeatRegistry {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    /// Record that `worker_id` is alive and consuming `subject`. Called on
    /// an interval by the worker harness; the key expires after
    /// [`HEARTBEAT_TTL_SECS`], so a crashed worker silently drops out.
    pub async fn beat(
        &self,
        worker_id: &str,
        worker_type: WorkerType,
        subject: Subject,
        current_jobs: u32,
    ) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let status = if current_jobs > 0 {
            WorkerLifecycleStatus::Processing
        } else {
            WorkerLifecycleStatus::Idle
        };

        let heartbeat = WorkerHeartbeat {
            worker_id: worker_id.to_string(),
            worker_type,
            subject: subject.as_str().to_string(),
            status,
            current_jobs,
            reported_at: chrono::Utc::now(),
        };

        let key = format!("vclip:worker:{}", worker_id);
        let payload = serde_json::to_string(&heartbeat)?;

        conn.set_ex::<_, _, ()>(&key, &payload, HEARTBEAT_TTL_SECS).await?;
        conn.sadd::<_, _, ()>(REGISTRY_KEY, worker_id).await?;

        Ok(())
    }

    /// Mark a worker as draining (finishing current job, accepting no more).
    pub async fn mark_draining(&self, worker_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("vclip:worker:{}", worker_id);

        let existing: Option<String> = conn.get(&key).await?;
        if let Some(existing) = existing {
            if let Ok(mut heartbeat) = serde_json::from_str::<WorkerHeartbeat>(&existing) {
                heartbeat.status = WorkerLifecycleStatus::Stopping;
                let payload = serde_json::to_string(&heartbeat)?;
                conn.set_ex::<_, _, ()>(&key, &payload, HEARTBEAT_TTL_SECS).await?;
            }
        }

        Ok(())
    }

    /// Remove a worker from the registry on clean shutdown.
    pub async fn deregister(&self, worker_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("vclip:worker:{}", worker_id);
        conn.del::<_, ()>(&key).await?;
        conn.srem::<_, _, ()>(REGISTRY_KEY, worker_id).await?;
        Ok(())
    }

    /// List every worker currently known (expired ones are pruned lazily:
    /// their key is gone but they may linger in the registry set until the
    /// next `beat`/`deregister` touches it, so callers should treat a
    /// missing heartbeat key as "worker is dead").
    pub async fn list(&self) -> QueueResult<Vec<WorkerHeartbeat>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let worker_ids: Vec<String> = conn.smembers(REGISTRY_KEY).await?;

        let mut heartbeats = Vec::new();
        for worker_id in worker_ids {
            let key = format!("vclip:worker:{}", worker_id);
            let payload: Option<String> = conn.get(&key).await?;
            match payload {
                Some(payload) => {
                    if let Ok(heartbeat) = serde_json::from_str::<WorkerHeartbeat>(&payload) {
                        heartbeats.push(heartbeat);
                    }
                }
                None => {
                    conn.srem::<_, _, ()>(REGISTRY_KEY, &worker_id).await?;
                }
            }
        }

        Ok(heartbeats)
    }
}
