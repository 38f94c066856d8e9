//! Transfer Intake - HTTP entry point
//!
//! ```text
//! ┌──────────┐    ┌────────────┐    ┌─────────────┐    ┌──────────┐
//! │  HTTP    │───▶│ Validator  │───▶│ Dedup Store │───▶│  Queue   │
//! │ Gateway  │    │            │    │ (SET NX EX) │    │ (XADD)   │
//! └──────────┘    └────────────┘    └─────────────┘    └──────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use redis::aio::ConnectionManager;

use transfer_intake::config::{AppConfig, QueueBackend, StoreBackend};
use transfer_intake::gateway::{self, AppState};
use transfer_intake::intake::{IntakeController, StatusQueryService};
use transfer_intake::queue::{MemoryQueue, QueuePublisher, RedisStreamPublisher};
use transfer_intake::store::{DedupStore, MemoryStore, RedisStore};

#[derive(Parser, Debug)]
#[command(name = "transfer_intake", version = env!("GIT_HASH"), about = "Idempotent transfer intake service")]
struct Args {
    /// Config environment, loads `{config_dir}/{env}.yaml`
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// Override `gateway.port`
    #[arg(long)]
    port: Option<u16>,

    #[arg(long, default_value = "config")]
    config_dir: String,
}

async fn redis_manager(url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(url).context("Failed to construct Redis client")?;
    ConnectionManager::new(client)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", url))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let app_config = AppConfig::load(&args.config_dir, &args.env)?;
    let _log_guard = transfer_intake::logging::init_logging(&app_config);

    tracing::info!(
        env = %args.env,
        version = env!("GIT_HASH"),
        "Starting transfer intake"
    );

    let needs_redis = app_config.store.backend == StoreBackend::Redis
        || app_config.queue.backend == QueueBackend::RedisStream;
    let redis_conn = if needs_redis {
        Some(redis_manager(&app_config.redis.url).await?)
    } else {
        None
    };

    let store: Arc<dyn DedupStore> = match (app_config.store.backend, &redis_conn) {
        (StoreBackend::Redis, Some(conn)) => Arc::new(RedisStore::from_manager(conn.clone())),
        _ => {
            tracing::warn!("Using in-memory dedup store; claims do not survive restarts");
            let memory = Arc::new(MemoryStore::new());
            // Detached; runs for the life of the process
            memory.clone().spawn_sweeper(app_config.store.sweep_interval());
            memory
        }
    };

    let publisher: Arc<dyn QueuePublisher> = match (app_config.queue.backend, &redis_conn) {
        (QueueBackend::RedisStream, Some(conn)) => Arc::new(RedisStreamPublisher::from_manager(
            conn.clone(),
            app_config.queue.stream_prefix.clone(),
        )),
        _ => {
            tracing::warn!("Using in-memory queue; published transfers are not delivered");
            Arc::new(MemoryQueue::new())
        }
    };

    tracing::info!(
        store = store.name(),
        publisher = publisher.name(),
        topic = %app_config.intake.topic,
        claim_ttl_secs = app_config.intake.claim_ttl_secs,
        release_policy = ?app_config.intake.claim_release_policy,
        "Intake backends ready"
    );

    let controller = Arc::new(IntakeController::new(
        store.clone(),
        publisher,
        &app_config.intake,
    ));
    let status = Arc::new(StatusQueryService::new(
        store.clone(),
        controller.keys().clone(),
    ));
    let state = Arc::new(AppState::new(controller, status, store));

    let port = args.port.unwrap_or(app_config.gateway.port);
    let addr = format!("{}:{}", app_config.gateway.host, port);
    gateway::run_server(&addr, state).await
}
