//! Health check handler

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
    /// Build version (git hash)
    #[schema(example = "a1b2c3d")]
    pub version: &'static str,
}

/// Health check endpoint
///
/// Pings the dedup store; a dead store means no request can be admitted, so
/// the service reports itself unavailable. The store error is logged but not
/// exposed in the response.
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms, version}}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    if let Err(e) = state.store.ping().await {
        tracing::error!(store = state.store.name(), error = %e, "[HEALTH] Store ping failed");
        return ApiError::service_unavailable("unavailable").into_err();
    }

    ok(HealthResponse {
        timestamp_ms: now_ms,
        version: env!("GIT_HASH"),
    })
}
