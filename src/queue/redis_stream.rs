//! Redis Streams publisher.
//!
//! Each topic maps to the stream `{stream_prefix}{topic}`. Entries carry two
//! fields, `message_id` and `payload`; consumers read them through a
//! consumer group and get at-least-once delivery.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, error};

use super::{FIELD_MESSAGE_ID, FIELD_PAYLOAD, MessageId, PublishError, QueuePublisher};

#[derive(Clone)]
pub struct RedisStreamPublisher {
    conn: ConnectionManager,
    stream_prefix: String,
}

impl RedisStreamPublisher {
    pub fn from_manager(conn: ConnectionManager, stream_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            stream_prefix: stream_prefix.into(),
        }
    }

    pub fn stream_key(&self, topic: &str) -> String {
        format!("{}{}", self.stream_prefix, topic)
    }
}

#[async_trait]
impl QueuePublisher for RedisStreamPublisher {
    fn name(&self) -> &'static str {
        "redis_stream"
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        message_id: &MessageId,
    ) -> Result<(), PublishError> {
        let key = self.stream_key(topic);
        let id = message_id.to_string();
        let mut conn = self.conn.clone();

        let entry_id: String = conn
            .xadd(
                &key,
                "*",
                &[(FIELD_MESSAGE_ID, id.as_bytes()), (FIELD_PAYLOAD, payload)],
            )
            .await
            .map_err(|e| {
                error!(stream = %key, message_id = %id, error = %e, "XADD failed");
                PublishError::from(e)
            })?;

        debug!(stream = %key, message_id = %id, entry_id = %entry_id, "Message appended to stream");
        Ok(())
    }
}
