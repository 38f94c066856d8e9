//! Idempotent Intake
//!
//! Accepts transfer requests, deduplicates them by caller-supplied
//! idempotency key and hands each logical request to the queue exactly once
//! per claim window.
//!
//! # Flow
//!
//! ```text
//! submit ─▶ validate ─▶ SET claim NX EX ─┬─ existed ─▶ Duplicate
//!              │                          └─ created ─▶ publish ─┬─ ok ─▶ SET status=pending ─▶ Accepted
//!              ▼                                                 └─ err ─▶ release/hold claim ─▶ Unavailable
//!          Rejected
//! ```
//!
//! # Records
//!
//! - claim  `claim:{key}`  = `processing`, TTL 24h
//! - status `status:{key}` = `pending` → `completed` | `failed`, same TTL
//!
//! The controller creates both; only the worker moves a status to a terminal
//! value (see [`crate::worker::StatusWriter`]).

pub mod controller;
pub mod status;
pub mod types;
pub mod validator;

pub use controller::{ClaimReleasePolicy, IntakeController};
pub use status::{StatusQueryError, StatusQueryService, StatusView};
pub use types::{
    CLAIM_MARKER, IntakeOutcome, KeySpace, RejectReason, TransferRequest, TransferStatus,
    UnavailableCause,
};
pub use validator::validate;
