use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::intake::ClaimReleasePolicy;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

/// Idempotent intake settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct IntakeConfig {
    /// Queue topic every admitted transfer is published to
    pub topic: String,
    /// Retention window for both the claim and the status record
    pub claim_ttl_secs: u64,
    /// What happens to a claim when the publish after it fails
    pub claim_release_policy: ClaimReleasePolicy,
    pub claim_prefix: String,
    pub status_prefix: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            topic: "transactions".to_string(),
            claim_ttl_secs: 24 * 60 * 60,
            claim_release_policy: ClaimReleasePolicy::Release,
            claim_prefix: "claim:".to_string(),
            status_prefix: "status:".to_string(),
        }
    }
}

impl IntakeConfig {
    pub fn claim_ttl(&self) -> Duration {
        Duration::from_secs(self.claim_ttl_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Memory backend only: how often expired keys are purged
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            sweep_interval_secs: 60,
        }
    }
}

impl StoreConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    #[default]
    RedisStream,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    /// Prepended to the topic to form the Redis Stream key
    pub stream_prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::RedisStream,
            stream_prefix: "stream:".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `{config_dir}/{env}.yaml`. `REDIS_URL` overrides `redis.url`.
    pub fn load(config_dir: impl AsRef<Path>, env: &str) -> Result<Self> {
        let config_path = config_dir.as_ref().join(format!("{}.yaml", env));
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config yaml: {}", config_path.display()))?;

        if let Ok(url) = std::env::var("REDIS_URL") {
            config.redis.url = url;
        }

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service would start with but could never serve.
    fn validate(&self) -> Result<()> {
        ensure!(
            self.intake.claim_ttl_secs > 0,
            "intake.claim_ttl_secs must be greater than zero"
        );
        ensure!(!self.intake.topic.is_empty(), "intake.topic must not be empty");
        ensure!(
            self.store.sweep_interval_secs > 0,
            "store.sweep_interval_secs must be greater than zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: intake.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.intake.topic, "transactions");
        assert_eq!(config.intake.claim_ttl(), Duration::from_secs(86_400));
        assert_eq!(
            config.intake.claim_release_policy,
            ClaimReleasePolicy::Release
        );
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.store.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.queue.backend, QueueBackend::RedisStream);
    }

    #[test]
    fn test_backend_and_policy_overrides() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
intake:
  topic: transfers
  claim_ttl_secs: 60
  claim_release_policy: hold_until_expiry
  claim_prefix: "c:"
  status_prefix: "s:"
store:
  backend: memory
queue:
  backend: memory
  stream_prefix: ""
"#
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.intake.topic, "transfers");
        assert_eq!(
            config.intake.claim_release_policy,
            ClaimReleasePolicy::HoldUntilExpiry
        );
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.queue.backend, QueueBackend::Memory);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let yaml = format!(
            "{}{}",
            MINIMAL,
            r#"
intake:
  claim_ttl_secs: 120
queue:
  backend: memory
"#
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.intake.claim_ttl_secs, 120);
        assert_eq!(config.intake.claim_prefix, "claim:");
        assert_eq!(config.queue.stream_prefix, "stream:");
    }

    #[test]
    fn test_shipped_configs_parse() {
        for env in ["dev", "prod"] {
            let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/config");
            let config = AppConfig::load(dir, env).unwrap();
            assert_eq!(config.intake.claim_ttl_secs, 86_400);
        }
    }

    #[test]
    fn test_zero_ttl_is_an_error() {
        let yaml = format!("{}\nintake:\n  claim_ttl_secs: 0\n", MINIMAL);
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("claim_ttl_secs"));

        let yaml = format!("{}\nstore:\n  sweep_interval_secs: 0\n", MINIMAL);
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_missing_gateway_is_an_error() {
        assert!(AppConfig::from_yaml("log_level: info").is_err());
    }
}
