//! Job bus adapter (§4.B): named durable Redis Streams, one per [`Subject`],
//! each with its own consumer group and dead-letter stream.

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::JobMessage;
use crate::subject::Subject;

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub redis_url: String,
    pub max_retries: u32,
    pub visibility_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            max_retries: 3,
            visibility_timeout: Duration::from_secs(600),
        }
    }
}

impl BusConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            max_retries: std::env::var("QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            visibility_timeout: Duration::from_secs(
                std::env::var("QUEUE_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}

/// The job bus client. One instance is shared by every orchestrator and by
/// every out-of-process worker; orchestrators only ever publish, workers
/// only ever subscribe/ack/nack (§4.B: "The orchestrators do not subscribe
/// directly; workers do.").
pub struct JobBus {
    client: redis::Client,
    config: BusConfig,
}

impl JobBus {
    pub fn new(config: BusConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> QueueResult<Self> {
        Self::new(BusConfig::from_env())
    }

    /// Create every subject's consumer group (idempotent: `BUSYGROUP` is swallowed).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        for subject in Subject::ALL {
            let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
                .arg("CREATE")
                .arg(subject.stream_key())
                .arg(subject.consumer_group())
                .arg("$")
                .arg("MKSTREAM")
                .query_async(&mut conn)
                .await;

            match result {
                Ok(_) => info!(subject = %subject, "created consumer group"),
                Err(e) if e.to_string().contains("BUSYGROUP") => {
                    debug!(subject = %subject, "consumer group already exists");
                }
                Err(e) => return Err(QueueError::Redis(e)),
            }
        }

        Ok(())
    }

    /// Publish a message with an explicit idempotency key.
    ///
    /// Returns the stream message id. Duplicate publishes for the same key
    /// within the dedup TTL are collapsed: the second call returns
    /// `Err(EnqueueFailed)` and the caller (an orchestrator) is expected to
    /// treat that as "already queued" rather than a hard failure.
    pub async fn publish(&self, message: &JobMessage, idempotency_key: &str) -> QueueResult<String> {
        let subject = message.subject();
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(message)?;
        let dedup_key = format!("vclip:dedup:{}:{}", subject, idempotency_key);

        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            warn!(subject = %subject, key = idempotency_key, "duplicate publish suppressed");
            return Err(QueueError::enqueue_failed("duplicate publish"));
        }

        let message_id: String = redis::cmd("XADD")
            .arg(subject.stream_key())
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(idempotency_key)
            .query_async(&mut conn)
            .await?;

        conn.set_ex::<_, _, ()>(&dedup_key, "1", 3600).await?;

        info!(subject = %subject, message_id = %message_id, "published job");
        Ok(message_id)
    }

    /// Publish using the message's default idempotency key (the primary entity id).
    pub async fn publish_default(&self, message: &JobMessage) -> QueueResult<String> {
        let key = message.default_idempotency_key();
        self.publish(message, &key).await
    }

    /// True if a message with this idempotency key is currently pending
    /// publish-dedup, i.e. a retry of `queue()` that finds the bus already
    /// holds the same attempt (§4.C tie-break rule).
    pub async fn has_pending_duplicate(&self, subject: Subject, idempotency_key: &str) -> QueueResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("vclip:dedup:{}:{}", subject, idempotency_key);
        let exists: bool = conn.exists(&dedup_key).await?;
        Ok(exists)
    }

    pub async fn clear_dedup(&self, subject: Subject, idempotency_key: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("vclip:dedup:{}:{}", subject, idempotency_key);
        conn.del::<_, ()>(&dedup_key).await?;
        Ok(())
    }

    /// Acknowledge and remove a message.
    pub async fn ack(&self, subject: Subject, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(subject.stream_key())
            .arg(subject.consumer_group())
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(subject.stream_key())
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(subject = %subject, message_id, "acked job");
        Ok(())
    }

    /// Move a message to its subject's dead-letter stream, then ack the original.
    pub async fn dlq(&self, subject: Subject, message_id: &str, message: &JobMessage, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(message)?;

        redis::cmd("XADD")
            .arg(subject.dlq_key())
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(subject, message_id).await?;
        warn!(subject = %subject, message_id, error, "moved job to DLQ");
        Ok(())
    }

    /// Purge all pending messages on exactly one subject (§4.I `clear_all`,
    /// S5). Other subjects' depths are unaffected.
    pub async fn purge(&self, subject: Subject) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let before: u64 = conn.xlen(subject.stream_key()).await?;

        redis::cmd("XTRIM")
            .arg(subject.stream_key())
            .arg("MAXLEN")
            .arg(0)
            .query_async::<()>(&mut conn)
            .await?;

        // Fast-forward the group past the trimmed history so redelivery of
        // already-purged ids never happens.
        redis::cmd("XGROUP")
            .arg("SETID")
            .arg(subject.stream_key())
            .arg(subject.consumer_group())
            .arg("$")
            .query_async::<()>(&mut conn)
            .await
            .ok();

        info!(subject = %subject, purged = before, "purged subject");
        Ok(before)
    }

    /// Pending message count for one subject.
    pub async fn depth(&self, subject: Subject) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(subject.stream_key()).await?;
        Ok(len)
    }

    pub async fn dlq_depth(&self, subject: Subject) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(subject.dlq_key()).await?;
        Ok(len)
    }

    /// Consume new messages from one subject (worker-side only).
    pub async fn consume(
        &self,
        subject: Subject,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, JobMessage)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(subject.consumer_group())
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(subject.stream_key())
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let mut messages = Vec::new();
        for stream_key in result.keys {
            for entry in stream_key.ids {
                let message_id = entry.id.clone();
                if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
                    let payload_str = String::from_utf8_lossy(payload);
                    match serde_json::from_str::<JobMessage>(&payload_str) {
                        Ok(job) => messages.push((message_id, job)),
                        Err(e) => {
                            warn!(subject = %subject, "failed to parse job payload: {e}");
                            self.ack(subject, &message_id).await.ok();
                        }
                    }
                }
            }
        }

        Ok(messages)
    }

    /// Claim messages idle longer than `min_idle_ms` (crashed worker recovery).
    pub async fn claim_pending(
        &self,
        subject: Subject,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, JobMessage)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let pending_details: Vec<Vec<redis::Value>> = redis::cmd("XPENDING")
            .arg(subject.stream_key())
            .arg(subject.consumer_group())
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut to_claim = Vec::new();
        for detail in pending_details {
            if let (Some(redis::Value::BulkString(id_bytes)), Some(redis::Value::Int(idle_ms))) =
                (detail.get(0), detail.get(2))
            {
                if *idle_ms as u64 >= min_idle_ms {
                    if let Ok(id) = String::from_utf8(id_bytes.clone()) {
                        to_claim.push(id);
                    }
                }
            }
        }

        if to_claim.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(subject.stream_key()).arg(subject.consumer_group()).arg(consumer_name).arg(min_idle_ms);
        for id in &to_claim {
            cmd.arg(id);
        }
        let claimed: Vec<Vec<redis::Value>> = cmd.query_async(&mut conn).await?;

        let mut messages = Vec::new();
        for entry in claimed {
            if let (Some(redis::Value::BulkString(id_bytes)), Some(redis::Value::Array(fields))) =
                (entry.get(0), entry.get(1))
            {
                let Ok(message_id) = String::from_utf8(id_bytes.clone()) else { continue };
                let mut payload: Option<String> = None;
                let mut i = 0;
                while i + 1 < fields.len() {
                    if let (Some(redis::Value::BulkString(k)), Some(redis::Value::BulkString(v))) =
                        (fields.get(i), fields.get(i + 1))
                    {
                        if let (Ok(field), Ok(value)) = (String::from_utf8(k.clone()), String::from_utf8(v.clone())) {
                            if field == "job" {
                                payload = Some(value);
                                break;
                            }
                        }
                    }
                    i += 2;
                }
                if let Some(payload) = payload {
                    match serde_json::from_str::<JobMessage>(&payload) {
                        Ok(job) => {
                            info!(subject = %subject, message_id = %message_id, "claimed pending job");
                            messages.push((message_id, job));
                        }
                        Err(e) => {
                            warn!("failed to parse claimed job payload: {e}");
                            self.ack(subject, &message_id).await.ok();
                        }
                    }
                }
            }
        }

        Ok(messages)
    }

    pub async fn get_retry_count(&self, subject: Subject, entity_key: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("vclip:retry:{}:{}", subject, entity_key);
        let count: Option<u32> = conn.get(&key).await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn increment_retry(&self, subject: Subject, entity_key: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("vclip:retry:{}:{}", subject, entity_key);
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, 86400).await?;
        Ok(count)
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.config.visibility_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_three_retries() {
        assert_eq!(BusConfig::default().max_retries, 3);
    }
}
