//! Worker-side status contract
//!
//! Downstream workers consume the transfer topic, execute transfers (out of
//! scope here) and then record the result. [`StatusWriter`] is the only way
//! they should touch a status record: it moves `pending` to a terminal value
//! with a compare-and-swap, so a redelivered message cannot flip a finished
//! transfer from `completed` to `failed` or back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::intake::{KeySpace, TransferRequest, TransferStatus};
use crate::queue::{FIELD_MESSAGE_ID, FIELD_PAYLOAD, MessageId};
use crate::store::{DedupStore, StoreError};

/// A transfer as delivered to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub message_id: MessageId,
    pub request: TransferRequest,
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid message id: {0}")]
    InvalidMessageId(#[from] uuid::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl TransferMessage {
    /// Rebuild a message from the envelope parts the publisher wrote.
    pub fn decode(message_id: &str, payload: &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            message_id: message_id.parse()?,
            request: serde_json::from_slice(payload)?,
        })
    }

    /// Decode a Redis Stream entry's field map.
    pub fn from_fields(fields: &HashMap<String, Vec<u8>>) -> Result<Self, DecodeError> {
        let id = fields
            .get(FIELD_MESSAGE_ID)
            .ok_or(DecodeError::MissingField(FIELD_MESSAGE_ID))?;
        let payload = fields
            .get(FIELD_PAYLOAD)
            .ok_or(DecodeError::MissingField(FIELD_PAYLOAD))?;
        let id = std::str::from_utf8(id).map_err(|_| DecodeError::MissingField(FIELD_MESSAGE_ID))?;
        Self::decode(id, payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// `pending` was replaced by the terminal value
    Applied,
    /// Already terminal; left untouched
    AlreadyTerminal(TransferStatus),
    /// No status record (never recorded or expired); left untouched
    Missing,
}

pub struct StatusWriter {
    store: Arc<dyn DedupStore>,
    keys: KeySpace,
    ttl: Duration,
}

impl StatusWriter {
    pub fn new(store: Arc<dyn DedupStore>, keys: KeySpace, ttl: Duration) -> Self {
        Self { store, keys, ttl }
    }

    pub async fn mark_completed(&self, idempotency_key: &str) -> Result<TransitionOutcome, StoreError> {
        self.finish(idempotency_key, TransferStatus::Completed).await
    }

    pub async fn mark_failed(&self, idempotency_key: &str) -> Result<TransitionOutcome, StoreError> {
        self.finish(idempotency_key, TransferStatus::Failed).await
    }

    async fn finish(
        &self,
        idempotency_key: &str,
        terminal: TransferStatus,
    ) -> Result<TransitionOutcome, StoreError> {
        debug_assert!(terminal.is_terminal());
        let status_key = self.keys.status_key(idempotency_key);

        let swapped = self
            .store
            .compare_and_swap(
                &status_key,
                TransferStatus::Pending.as_str(),
                terminal.as_str(),
                self.ttl,
            )
            .await?;

        if swapped {
            info!(idempotency_key = idempotency_key, status = %terminal, "Transfer status finalized");
            return Ok(TransitionOutcome::Applied);
        }

        let current = self.store.get(&status_key).await?;
        match current.as_deref().and_then(TransferStatus::parse) {
            Some(status) if status.is_terminal() => {
                warn!(
                    idempotency_key = idempotency_key,
                    current = %status,
                    requested = %terminal,
                    "Status already terminal, transition ignored"
                );
                Ok(TransitionOutcome::AlreadyTerminal(status))
            }
            _ => {
                warn!(
                    idempotency_key = idempotency_key,
                    requested = %terminal,
                    "No pending status record, transition ignored"
                );
                Ok(TransitionOutcome::Missing)
            }
        }
    }
}
