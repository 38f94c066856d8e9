//! HTTP handlers
//!
//! - [`transfer`]: submission and status lookup
//! - [`health`]: liveness with a store ping

pub mod health;
pub mod transfer;

pub use health::{HealthResponse, health_check};
pub use transfer::{get_transfer_status, submit_transfer};
