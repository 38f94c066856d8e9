//! Dedup Store
//!
//! Key-value store holding idempotency claims and status records, each with a
//! per-key expiration. The intake path relies on exactly one cross-request
//! guarantee from it: `set_if_absent` is atomic.
//!
//! Backends:
//! - [`RedisStore`]: `SET key value NX EX ttl`
//! - [`MemoryStore`]: DashMap entry API, for dev mode and tests

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid TTL: {0:?}")]
    InvalidTtl(Duration),
}

impl From<::redis::RedisError> for StoreError {
    fn from(e: ::redis::RedisError) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Create `key` only if it does not exist. Returns `true` if this call
    /// created it. Must be a single atomic operation.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Unconditional write with expiry
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Replace the value only if it currently equals `expected`, resetting the
    /// expiry. Returns `true` if the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Absent and expired keys both read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Liveness check for the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Whole seconds for backends with second-granularity expiry. Sub-second
/// remainders round up so a TTL never shrinks to zero.
pub(crate) fn ttl_secs(ttl: Duration) -> Result<usize, StoreError> {
    let mut secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs += 1;
    }
    if secs == 0 {
        return Err(StoreError::InvalidTtl(ttl));
    }
    usize::try_from(secs).map_err(|_| StoreError::InvalidTtl(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_secs_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_secs(86_400)).unwrap(), 86_400);
        assert_eq!(ttl_secs(Duration::from_millis(1_500)).unwrap(), 2);
        assert_eq!(ttl_secs(Duration::from_millis(1)).unwrap(), 1);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(matches!(
            ttl_secs(Duration::ZERO),
            Err(StoreError::InvalidTtl(_))
        ));
    }
}
