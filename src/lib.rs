//! Transfer Intake - Idempotent Transfer Submission Service
//!
//! Accepts transfer requests over HTTP, deduplicates them by caller-supplied
//! idempotency key and publishes each logical request to a queue at most once
//! per claim window.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration (`config/{env}.yaml`)
//! - [`logging`] - tracing subscriber setup
//! - [`store`] - Dedup store: atomic claims and status records
//! - [`queue`] - Queue publisher abstraction
//! - [`intake`] - Validator, controller and status query
//! - [`worker`] - Status transitions for downstream workers
//! - [`gateway`] - HTTP surface

pub mod config;
pub mod logging;

// Infrastructure seams
pub mod queue;
pub mod store;

// Domain
pub mod intake;
pub mod worker;

// HTTP
pub mod gateway;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use intake::{
    ClaimReleasePolicy, IntakeController, IntakeOutcome, KeySpace, RejectReason,
    StatusQueryService, StatusView, TransferRequest, TransferStatus,
};
pub use queue::{MemoryQueue, MessageId, PublishError, QueuePublisher, RedisStreamPublisher};
pub use store::{DedupStore, MemoryStore, RedisStore, StoreError};
pub use worker::{StatusWriter, TransferMessage, TransitionOutcome};
