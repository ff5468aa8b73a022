//! Progress tracker transport (§4.K).
//!
//! The tracker itself is a process-local map keyed by `(user_id, entity_id)`
//! coalescing publishes to at most one per 100ms, with terminal events
//! bypassing coalescing and flushing immediately. This module provides the
//! durable side: Redis Pub/Sub for live delivery plus a short-lived sorted
//! set so a client that reconnects mid-job can replay what it missed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::debug;
use vclip_models::ProgressEvent;

use crate::error::QueueResult;

const PROGRESS_HISTORY_TTL_SECS: u64 = 3600;
const COALESCE_WINDOW: Duration = Duration::from_millis(100);

fn channel_name(user_id: &str, entity_id: &str) -> String {
    format!("vclip:progress:{}:{}", user_id, entity_id)
}

fn history_key(user_id: &str, entity_id: &str) -> String {
    format!("vclip:progress:history:{}:{}", user_id, entity_id)
}

/// Redis-backed transport: Pub/Sub for live subscribers, sorted set for replay.
#[derive(Clone)]
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Publish one event: Pub/Sub for live delivery, sorted set for replay,
    /// scored so `get_history_since` can filter by wall-clock.
    pub async fn publish(&self, event: &ProgressEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = channel_name(&event.user_id, &event.entity_id);
        let history = history_key(&event.user_id, &event.entity_id);
        let payload = serde_json::to_string(event)?;
        let score = chrono::Utc::now().timestamp_millis() as f64;

        debug!(channel = %channel, terminal = event.terminal, "publishing progress event");

        redis::pipe()
            .publish(&channel, &payload)
            .ignore()
            .zadd(&history, &payload, score)
            .ignore()
            .expire(&history, PROGRESS_HISTORY_TTL_SECS as i64)
            .ignore()
            .exec_async(&mut conn)
            .await?;

        Ok(())
    }

    /// Subscribe to live events for one `(user_id, entity_id)` pair.
    pub async fn subscribe(
        &self,
        user_id: &str,
        entity_id: &str,
    ) -> QueueResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = ProgressEvent> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel_name(user_id, entity_id)).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }

    /// Replay events published since `since_ms`, for a client reconnecting
    /// mid-job.
    pub async fn history_since(&self, user_id: &str, entity_id: &str, since_ms: i64) -> QueueResult<Vec<ProgressEvent>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = history_key(user_id, entity_id);

        let events: Vec<String> = conn.zrangebyscore(&key, since_ms as f64, "+inf").await?;
        Ok(events.into_iter().filter_map(|s| serde_json::from_str(&s).ok()).collect())
    }

    pub async fn clear_history(&self, user_id: &str, entity_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(history_key(user_id, entity_id)).await?;
        Ok(())
    }
}

/// The in-process coalescing tracker (§4.K). One instance is shared by every
/// orchestrator via capability injection. Non-terminal events for the same
/// `(user_id, entity_id)` published within [`COALESCE_WINDOW`] of the last
/// flush are dropped in favor of the newest one; terminal events always
/// flush immediately and reset the window.
#[derive(Clone)]
pub struct ProgressTracker {
    channel: ProgressChannel,
    last_flush: Arc<Mutex<HashMap<(String, String), Instant>>>,
}

impl ProgressTracker {
    pub fn new(channel: ProgressChannel) -> Self {
        Self {
            channel,
            last_flush: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a progress event, coalescing non-terminal updates.
    pub async fn record(&self, event: ProgressEvent) -> QueueResult<()> {
        if event.terminal {
            self.flush(event).await?;
            return Ok(());
        }

        let key = event.key();
        let now = Instant::now();

        let should_flush = {
            let mut guard = self.last_flush.lock().await;
            match guard.get(&key) {
                Some(last) if now.duration_since(*last) < COALESCE_WINDOW => false,
                _ => {
                    guard.insert(key, now);
                    true
                }
            }
        };

        if should_flush {
            self.flush(event).await?;
        }

        Ok(())
    }

    async fn flush(&self, event: ProgressEvent) -> QueueResult<()> {
        if event.terminal {
            let mut guard = self.last_flush.lock().await;
            guard.remove(&event.key());
        }
        self.channel.publish(&event).await
    }

    pub fn channel(&self) -> &ProgressChannel {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_is_keyed_by_user_and_entity() {
        assert_eq!(channel_name("u1", "e1"), "vclip:progress:u1:e1");
    }
}
