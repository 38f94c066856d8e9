//! Transfer intake handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, StatusQuery, SubmitStatus, TransferAcceptedData, TransferDuplicateData,
    TransferStatusData, error_codes, ok, with_status,
};
use crate::intake::{IntakeOutcome, StatusQueryError};

fn error_code(outcome: &IntakeOutcome) -> i32 {
    match outcome {
        IntakeOutcome::Rejected(reason) if reason.is_malformed() => error_codes::MALFORMED_REQUEST,
        IntakeOutcome::Rejected(_) => error_codes::INVALID_PARAMETER,
        IntakeOutcome::Unavailable(_) => error_codes::SERVICE_UNAVAILABLE,
        _ => error_codes::SUCCESS,
    }
}

/// Submit a transfer
///
/// POST /api/v1/transfer
///
/// The body is read raw so malformed JSON maps to the intake's own
/// rejection instead of axum's extractor error. HTTP status comes from
/// [`IntakeOutcome::http_status`].
#[utoipa::path(
    post,
    path = "/api/v1/transfer",
    request_body(content = String, description = "Transfer request: idempotency_key, source_id, target_id, amount", content_type = "application/json"),
    responses(
        (status = 202, description = "Transfer accepted and queued", body = TransferAcceptedData, content_type = "application/json"),
        (status = 200, description = "Duplicate request acknowledged", body = TransferDuplicateData, content_type = "application/json"),
        (status = 400, description = "Malformed body or invalid parameters"),
        (status = 503, description = "Dedup store or queue unavailable")
    ),
    tag = "Transfer"
)]
pub async fn submit_transfer(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = state.controller.submit(&body).await;
    let status = outcome.http_status();
    let code = error_code(&outcome);

    match outcome {
        IntakeOutcome::Accepted { message_id, .. } => with_status(
            status,
            TransferAcceptedData {
                status: SubmitStatus::Accepted,
                message_id,
            },
        )
        .into_response(),
        IntakeOutcome::Duplicate { idempotency_key } => with_status(
            status,
            TransferDuplicateData {
                status: SubmitStatus::DuplicateRequestAcknowledged,
                idempotency_key,
            },
        )
        .into_response(),
        IntakeOutcome::Rejected(reason) => {
            ApiError::new(status, code, reason.to_string()).into_response()
        }
        IntakeOutcome::Unavailable(cause) => {
            ApiError::new(status, code, cause.message()).into_response()
        }
    }
}

/// Look up transfer status by idempotency key
///
/// GET /api/v1/transfer/status?idempotency_key=...
#[utoipa::path(
    get,
    path = "/api/v1/transfer/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Current status, `unknown` if no record", body = TransferStatusData, content_type = "application/json"),
        (status = 400, description = "Missing idempotency_key"),
        (status = 500, description = "Status record holds an unrecognized value"),
        (status = 503, description = "Dedup store unavailable")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<TransferStatusData> {
    let key = match query.idempotency_key {
        Some(key) if !key.is_empty() => key,
        _ => return ApiError::bad_request("idempotency_key is required").into_err(),
    };

    match state.status.query(&key).await {
        Ok(status) => ok(TransferStatusData {
            idempotency_key: key,
            status,
        }),
        Err(StatusQueryError::Store(e)) => {
            ApiError::service_unavailable(format!("Status lookup failed: {}", e)).into_err()
        }
        Err(StatusQueryError::Unrecognized(_)) => {
            ApiError::internal("Status record is corrupt").into_err()
        }
    }
}
