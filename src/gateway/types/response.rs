//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - Transfer intake response DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::intake::StatusView;
use crate::queue::MessageId;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or absent (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Intake outcome label carried in `data.status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    Accepted,
    DuplicateRequestAcknowledged,
}

/// Returned with 202 when a request is newly admitted
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferAcceptedData {
    #[schema(example = "accepted")]
    pub status: SubmitStatus,
    /// Identifier of the queued message
    #[schema(value_type = String, example = "3f2b8c1e-7d4a-4a5e-9b1f-2c6d8e0a4b7c")]
    pub message_id: MessageId,
}

/// Returned with 200 when the key already has a live claim
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferDuplicateData {
    #[schema(example = "duplicate_request_acknowledged")]
    pub status: SubmitStatus,
    #[schema(example = "k1")]
    pub idempotency_key: String,
}

/// Status lookup result
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferStatusData {
    #[schema(example = "k1")]
    pub idempotency_key: String,
    #[schema(example = "pending")]
    pub status: StatusView,
}

/// Query string for the status endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Key the transfer was submitted with
    #[serde(default, alias = "idempotencyKey")]
    pub idempotency_key: Option<String>,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const MALFORMED_REQUEST: i32 = 1000;
    pub const INVALID_PARAMETER: i32 = 1001;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}
