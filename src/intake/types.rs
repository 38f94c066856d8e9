//! Intake data model

use std::fmt;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::queue::MessageId;

/// Marker value stored under a claim key
pub const CLAIM_MARKER: &str = "processing";

/// A validated transfer request.
///
/// Immutable once validated; this exact value is serialized into the queue
/// payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(alias = "idempotencyKey")]
    pub idempotency_key: String,
    #[serde(alias = "sourceID", alias = "sourceId")]
    pub source_id: i64,
    #[serde(alias = "targetID", alias = "targetId")]
    pub target_id: i64,
    pub amount: Decimal,
}

/// Processing state stored in a status record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// Admitted and queued, worker has not finished
    Pending,
    /// Terminal: worker executed the transfer
    Completed,
    /// Terminal: worker gave up permanently
    Failed,
}

impl TransferStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "completed" => Some(TransferStatus::Completed),
            "failed" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives store keys from an idempotency key.
///
/// Claims and status records live under different prefixes, and both are
/// always prefixed, so no caller-chosen key can collide with the other
/// namespace.
#[derive(Debug, Clone)]
pub struct KeySpace {
    claim_prefix: String,
    status_prefix: String,
}

impl KeySpace {
    pub fn new(claim_prefix: impl Into<String>, status_prefix: impl Into<String>) -> Self {
        Self {
            claim_prefix: claim_prefix.into(),
            status_prefix: status_prefix.into(),
        }
    }

    pub fn claim_key(&self, idempotency_key: &str) -> String {
        format!("{}{}", self.claim_prefix, idempotency_key)
    }

    pub fn status_key(&self, idempotency_key: &str) -> String {
        format!("{}{}", self.status_prefix, idempotency_key)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("claim:", "status:")
    }
}

/// Why a raw request was turned away before touching the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Body did not parse as the expected JSON shape
    Malformed(String),
    NonPositiveAmount,
    SameAccount,
    EmptyIdempotencyKey,
}

impl RejectReason {
    /// `true` for unparseable input, `false` for parameter violations
    pub fn is_malformed(&self) -> bool {
        matches!(self, RejectReason::Malformed(_))
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Malformed(detail) => write!(f, "Invalid JSON: {}", detail),
            RejectReason::NonPositiveAmount => f.write_str("Amount must be greater than zero"),
            RejectReason::SameAccount => {
                f.write_str("Source and target account cannot be the same")
            }
            RejectReason::EmptyIdempotencyKey => f.write_str("Idempotency key must not be empty"),
        }
    }
}

/// Which dependency made the intake path give up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableCause {
    /// The atomic claim could not be written
    ClaimStore,
    /// The claim was taken but the broker did not accept the message
    Publish,
}

impl UnavailableCause {
    pub fn message(&self) -> &'static str {
        match self {
            UnavailableCause::ClaimStore => "Dedup store unavailable, retry with the same key",
            UnavailableCause::Publish => "Queue unavailable, transfer was not accepted",
        }
    }
}

/// Result of one `submit` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Newly admitted and durably queued. `status_recorded` is `false` when
    /// the initial `pending` record could not be written (degraded).
    Accepted {
        message_id: MessageId,
        status_recorded: bool,
    },
    /// A live claim already exists for this key; nothing was published
    Duplicate { idempotency_key: String },
    Rejected(RejectReason),
    Unavailable(UnavailableCause),
}

impl IntakeOutcome {
    pub fn http_status(&self) -> StatusCode {
        match self {
            IntakeOutcome::Accepted { .. } => StatusCode::ACCEPTED,
            IntakeOutcome::Duplicate { .. } => StatusCode::OK,
            IntakeOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
            IntakeOutcome::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
