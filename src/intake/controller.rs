//! Idempotent Intake Controller
//!
//! Drives one request through validate → claim → publish → status-init.
//!
//! # Safety Invariants
//!
//! 1. **Atomic Claim**: admission is decided by a single `set_if_absent` on
//!    the claim key. There is no existence check beforehand, so two
//!    concurrent requests with the same key cannot both be admitted.
//! 2. **Duplicate Is Inert**: a request that loses the claim publishes
//!    nothing and never touches the status record.
//! 3. **Publish Before Pending**: the `pending` record is written only after
//!    the broker accepted the message.
//! 4. **No Silent Publish Failure**: a failed publish is always reported as
//!    `Unavailable`, after applying the configured [`ClaimReleasePolicy`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::types::{
    CLAIM_MARKER, IntakeOutcome, KeySpace, TransferRequest, TransferStatus, UnavailableCause,
};
use super::validator;
use crate::config::IntakeConfig;
use crate::queue::{MessageId, QueuePublisher};
use crate::store::DedupStore;

/// What to do with a claim whose publish failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimReleasePolicy {
    /// Delete the claim so the caller can retry right away with the same key.
    #[default]
    Release,
    /// Keep the claim; the key is locked out until the TTL expires.
    HoldUntilExpiry,
}

pub struct IntakeController {
    store: Arc<dyn DedupStore>,
    publisher: Arc<dyn QueuePublisher>,
    keys: KeySpace,
    topic: String,
    ttl: Duration,
    release_policy: ClaimReleasePolicy,
}

impl IntakeController {
    pub fn new(
        store: Arc<dyn DedupStore>,
        publisher: Arc<dyn QueuePublisher>,
        config: &IntakeConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            keys: KeySpace::new(config.claim_prefix.clone(), config.status_prefix.clone()),
            topic: config.topic.clone(),
            ttl: config.claim_ttl(),
            release_policy: config.claim_release_policy,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Validate and, if the key is fresh, enqueue one transfer request.
    pub async fn submit(&self, raw: &[u8]) -> IntakeOutcome {
        let req = match validator::validate(raw) {
            Ok(req) => req,
            Err(reason) => {
                debug!(reason = %reason, "Transfer rejected");
                return IntakeOutcome::Rejected(reason);
            }
        };
        self.admit(&req).await
    }

    /// Claim, publish and record status for an already validated request.
    pub async fn admit(&self, req: &TransferRequest) -> IntakeOutcome {
        let key = req.idempotency_key.as_str();
        let claim_key = self.keys.claim_key(key);

        // 1. Atomic claim
        let created = match self
            .store
            .set_if_absent(&claim_key, CLAIM_MARKER, self.ttl)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                error!(
                    idempotency_key = key,
                    store = self.store.name(),
                    error = %e,
                    "Failed to write idempotency claim"
                );
                return IntakeOutcome::Unavailable(UnavailableCause::ClaimStore);
            }
        };

        if !created {
            info!(idempotency_key = key, "Duplicate request acknowledged");
            return IntakeOutcome::Duplicate {
                idempotency_key: key.to_string(),
            };
        }

        // 2. Publish
        let message_id = MessageId::new();
        let payload = match serde_json::to_vec(req) {
            Ok(payload) => payload,
            Err(e) => {
                error!(idempotency_key = key, error = %e, "Failed to serialize transfer");
                self.on_publish_failure(key, &claim_key).await;
                return IntakeOutcome::Unavailable(UnavailableCause::Publish);
            }
        };

        if let Err(e) = self
            .publisher
            .publish(&self.topic, &payload, &message_id)
            .await
        {
            error!(
                idempotency_key = key,
                message_id = %message_id,
                topic = %self.topic,
                publisher = self.publisher.name(),
                error = %e,
                "Failed to publish transfer"
            );
            self.on_publish_failure(key, &claim_key).await;
            return IntakeOutcome::Unavailable(UnavailableCause::Publish);
        }

        // 3. Initial status (non-fatal)
        let status_key = self.keys.status_key(key);
        let status_recorded = match self
            .store
            .put(&status_key, TransferStatus::Pending.as_str(), self.ttl)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    idempotency_key = key,
                    message_id = %message_id,
                    error = %e,
                    "DEGRADED: transfer queued but pending status not recorded"
                );
                false
            }
        };

        info!(
            idempotency_key = key,
            message_id = %message_id,
            source_id = req.source_id,
            target_id = req.target_id,
            amount = %req.amount,
            "Transfer accepted"
        );

        IntakeOutcome::Accepted {
            message_id,
            status_recorded,
        }
    }

    async fn on_publish_failure(&self, key: &str, claim_key: &str) {
        match self.release_policy {
            ClaimReleasePolicy::Release => {
                if let Err(e) = self.store.delete(claim_key).await {
                    error!(
                        idempotency_key = key,
                        error = %e,
                        "Failed to release claim after publish failure; key locked until TTL"
                    );
                } else {
                    debug!(idempotency_key = key, "Claim released after publish failure");
                }
            }
            ClaimReleasePolicy::HoldUntilExpiry => {
                warn!(
                    idempotency_key = key,
                    ttl_secs = self.ttl.as_secs(),
                    "Claim held after publish failure; key locked until TTL"
                );
            }
        }
    }
}
