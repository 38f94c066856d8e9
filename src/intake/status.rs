//! Status Query Service
//!
//! Read-only view of the status record for an idempotency key.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use super::types::{KeySpace, TransferStatus};
use crate::store::{DedupStore, StoreError};

/// Caller-facing processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusView {
    /// No status record: never submitted, expired, or never recorded
    Unknown,
    Pending,
    Completed,
    Failed,
}

impl StatusView {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusView::Unknown => "unknown",
            StatusView::Pending => "pending",
            StatusView::Completed => "completed",
            StatusView::Failed => "failed",
        }
    }
}

impl From<TransferStatus> for StatusView {
    fn from(status: TransferStatus) -> Self {
        match status {
            TransferStatus::Pending => StatusView::Pending,
            TransferStatus::Completed => StatusView::Completed,
            TransferStatus::Failed => StatusView::Failed,
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone)]
pub enum StatusQueryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unrecognized status value: {0}")]
    Unrecognized(String),
}

pub struct StatusQueryService {
    store: Arc<dyn DedupStore>,
    keys: KeySpace,
}

impl StatusQueryService {
    pub fn new(store: Arc<dyn DedupStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    pub async fn query(&self, idempotency_key: &str) -> Result<StatusView, StatusQueryError> {
        if idempotency_key.is_empty() {
            return Ok(StatusView::Unknown);
        }

        let status_key = self.keys.status_key(idempotency_key);
        let stored = self.store.get(&status_key).await.map_err(|e| {
            error!(idempotency_key = idempotency_key, error = %e, "Status lookup failed");
            e
        })?;

        match stored {
            None => Ok(StatusView::Unknown),
            Some(value) => match TransferStatus::parse(&value) {
                Some(status) => Ok(status.into()),
                None => {
                    warn!(
                        idempotency_key = idempotency_key,
                        value = %value,
                        "Status record holds an unrecognized value"
                    );
                    Err(StatusQueryError::Unrecognized(value))
                }
            },
        }
    }
}
