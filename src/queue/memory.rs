//! In-process queue.
//!
//! Keeps the most recent messages per topic and fans each one out to live
//! subscribers over a tokio broadcast channel. Used in dev mode and by tests
//! that need to observe what the intake path enqueued.

use std::collections::VecDeque;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

use super::{MessageId, PublishError, QueuePublisher};

const SUBSCRIBER_BUFFER: usize = 1024;
/// Messages kept per topic before the oldest are dropped
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub topic: String,
    pub message_id: MessageId,
    pub payload: Vec<u8>,
}

struct TopicLog {
    messages: VecDeque<QueuedMessage>,
    sender: broadcast::Sender<QueuedMessage>,
}

impl TopicLog {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self {
            messages: VecDeque::new(),
            sender,
        }
    }
}

pub struct MemoryQueue {
    topics: DashMap<String, TopicLog>,
    retention: usize,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `retention` messages per topic (minimum 1).
    pub fn with_retention(retention: usize) -> Self {
        Self {
            topics: DashMap::new(),
            retention: retention.max(1),
        }
    }

    /// Receive every message published to `topic` after this call.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<QueuedMessage> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(TopicLog::new)
            .sender
            .subscribe()
    }

    /// Snapshot of the retained messages for `topic`, in publish order.
    pub fn messages(&self, topic: &str) -> Vec<QueuedMessage> {
        self.topics
            .get(topic)
            .map(|log| log.messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|log| log.messages.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, topic: &str) -> bool {
        self.len(topic) == 0
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        message_id: &MessageId,
    ) -> Result<(), PublishError> {
        let message = QueuedMessage {
            topic: topic.to_string(),
            message_id: *message_id,
            payload: payload.to_vec(),
        };

        let mut log = self
            .topics
            .entry(topic.to_string())
            .or_insert_with(TopicLog::new);
        if log.messages.len() == self.retention {
            log.messages.pop_front();
        }
        log.messages.push_back(message.clone());
        // No subscribers is fine; the log still holds the message.
        let _ = log.sender.send(message);

        debug!(topic = topic, message_id = %message_id, "Message enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_is_logged_and_broadcast() {
        let queue = MemoryQueue::new();
        let mut rx = queue.subscribe("transactions");
        let id = MessageId::new();

        queue.publish("transactions", b"{}", &id).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.message_id, id);
        assert_eq!(received.payload, b"{}".to_vec());
        assert_eq!(queue.len("transactions"), 1);
        assert!(queue.is_empty("other"));
    }

    #[tokio::test]
    async fn test_messages_keep_publish_order() {
        let queue = MemoryQueue::new();
        let first = MessageId::new();
        let second = MessageId::new();

        queue.publish("t", b"1", &first).await.unwrap();
        queue.publish("t", b"2", &second).await.unwrap();

        let ids: Vec<_> = queue.messages("t").iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_retention_drops_oldest() {
        let queue = MemoryQueue::with_retention(2);
        let mut rx = queue.subscribe("t");
        let ids: Vec<_> = (0..3).map(|_| MessageId::new()).collect();

        for id in &ids {
            queue.publish("t", b"x", id).await.unwrap();
        }

        let kept: Vec<_> = queue.messages("t").iter().map(|m| m.message_id).collect();
        assert_eq!(kept, vec![ids[1], ids[2]]);
        // Subscribers still saw all three
        for id in &ids {
            assert_eq!(rx.recv().await.unwrap().message_id, *id);
        }
    }
}
