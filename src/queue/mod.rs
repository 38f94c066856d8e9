//! Queue Publisher
//!
//! Durable at-least-once transport into which admitted transfers are
//! enqueued. The intake path only needs `publish(topic, payload, id)`.
//!
//! Backends:
//! - [`RedisStreamPublisher`]: one Redis Stream per topic (`XADD`)
//! - [`MemoryQueue`]: in-process log with broadcast subscribers

pub mod memory;
pub mod redis_stream;

pub use memory::{MemoryQueue, QueuedMessage};
pub use redis_stream::RedisStreamPublisher;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stream entry field carrying the message id
pub const FIELD_MESSAGE_ID: &str = "message_id";
/// Stream entry field carrying the serialized request
pub const FIELD_PAYLOAD: &str = "payload";

/// Unique identifier attached to every published message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Broker rejected message: {0}")]
    Rejected(String),
}

impl From<redis::RedisError> for PublishError {
    fn from(e: redis::RedisError) -> Self {
        PublishError::Unavailable(e.to_string())
    }
}

#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Returns once the broker has durably accepted the message.
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        message_id: &MessageId,
    ) -> Result<(), PublishError>;
}
