//! Redis-backed dedup store.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ExistenceCheck, Script, SetExpiry, SetOptions};
use tracing::{debug, error};

use super::{DedupStore, StoreError, ttl_secs};

/// GET + SET under one script so the comparison and the write cannot
/// interleave with another client.
const COMPARE_AND_SWAP: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
end
return 0
"#;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("failed to construct Redis client")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;
        Ok(Self::from_manager(conn))
    }

    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DedupStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let ttl = ttl_secs(ttl)?;
        let mut conn = self.conn.clone();

        // SET key value NX EX ttl: OK when created, nil when the key exists
        let reply: Option<String> = conn
            .set_options(
                key,
                value,
                SetOptions::default()
                    .conditional_set(ExistenceCheck::NX)
                    .with_expiration(SetExpiry::EX(ttl)),
            )
            .await
            .map_err(|e| {
                error!(key = key, error = %e, "SET NX failed");
                StoreError::from(e)
            })?;
        let created = reply.is_some();

        debug!(key = key, created = created, "set_if_absent");
        Ok(created)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let ttl = ttl_secs(ttl)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_options(
                key,
                value,
                SetOptions::default().with_expiration(SetExpiry::EX(ttl)),
            )
            .await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let ttl = ttl_secs(ttl)?;
        let mut conn = self.conn.clone();
        let swapped: i64 = Script::new(COMPARE_AND_SWAP)
            .key(key)
            .arg(expected)
            .arg(new)
            .arg(ttl)
            .invoke_async(&mut conn)
            .await?;
        Ok(swapped == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
