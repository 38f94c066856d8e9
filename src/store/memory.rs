//! In-process dedup store.
//!
//! Each key lives in a DashMap shard; the conditional operations run entirely
//! under that shard's lock via the entry API, so concurrent `set_if_absent`
//! calls for one key are serialized. Expiry is lazy: an expired entry is
//! treated as absent and overwritten or dropped on the next touch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};

use super::{DedupStore, StoreError};

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    #[inline]
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe in-memory store with per-key TTL.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries still within their TTL.
    pub fn live_len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| v.is_live(now));
        before - self.entries.len()
    }

    /// Purge expired entries every `period` until the task is aborted.
    ///
    /// Lazy expiry only reclaims keys that are touched again; keys submitted
    /// once and never queried would otherwise stay in memory forever.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(period_secs = period.as_secs(), "[MemoryStore] Sweeper started");

            loop {
                tick.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = self.entries.len(),
                        "[MemoryStore] Purged expired keys"
                    );
                }
            }
        })
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    Ok(false)
                } else {
                    occupied.insert(StoredValue::new(value, ttl));
                    Ok(true)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl(ttl));
        }
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.is_live(now) && current.value == expected {
                    occupied.insert(StoredValue::new(new, ttl));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(_) => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone());
        if live.is_none() {
            self.entries.remove_if(key, |_, v| !v.is_live(now));
        }
        Ok(live)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_if_absent_only_first_wins() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("k", "processing", TTL).await.unwrap());
        assert!(!store.set_if_absent("k", "other", TTL).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("processing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_key_is_absent_and_reusable() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("k", "processing", TTL).await.unwrap());

        tokio::time::advance(TTL + Duration::from_millis(1)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.set_if_absent("k", "processing", TTL).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        store.put("a", "1", Duration::from_secs(1)).await.unwrap();
        store.put("b", "1", TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.live_len(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_untouched_keys() {
        let store = Arc::new(MemoryStore::new());
        store.put("a", "1", Duration::from_secs(5)).await.unwrap();
        store.put("b", "1", TTL).await.unwrap();
        let sweeper = store.clone().spawn_sweeper(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(11)).await;

        // "a" was never read again, only the sweeper could have dropped it
        assert_eq!(store.entries.len(), 1);
        assert!(store.entries.contains_key("b"));
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();
        assert!(!store.compare_and_swap("s", "pending", "completed", TTL).await.unwrap());

        store.put("s", "pending", TTL).await.unwrap();
        assert!(store.compare_and_swap("s", "pending", "completed", TTL).await.unwrap());
        assert!(!store.compare_and_swap("s", "pending", "failed", TTL).await.unwrap());
        assert_eq!(store.get("s").await.unwrap().as_deref(), Some("completed"));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let store = MemoryStore::new();
        store.delete("nope").await.unwrap();
        store.put("k", "v", TTL).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.set_if_absent("k", "v", Duration::ZERO).await,
            Err(StoreError::InvalidTtl(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_if_absent("race", "processing", TTL).await.unwrap()
            }));
        }

        let mut created = 0;
        for h in handles {
            if h.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }
}
