//! OpenAPI / Swagger UI Documentation
//!
//! Auto-generated OpenAPI 3.0 documentation for the transfer intake API.
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    SubmitStatus, TransferAcceptedData, TransferDuplicateData, TransferStatusData,
};
use crate::intake::StatusView;

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Transfer Intake API",
        version = "1.0.0",
        description = "Idempotent transfer submission: each idempotency key is queued at most once per claim window.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::transfer::submit_transfer,
        crate::gateway::handlers::transfer::get_transfer_status,
    ),
    components(
        schemas(
            HealthResponse,
            SubmitStatus,
            StatusView,
            TransferAcceptedData,
            TransferDuplicateData,
            TransferStatusData,
        )
    ),
    tags(
        (name = "Transfer", description = "Transfer submission and status"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Transfer Intake API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json_str = ApiDoc::openapi().to_json().unwrap();
        assert!(json_str.contains("Transfer Intake API"));
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths;
        assert!(paths.paths.contains_key("/api/v1/health"));
        assert!(paths.paths.contains_key("/api/v1/transfer"));
        assert!(paths.paths.contains_key("/api/v1/transfer/status"));
    }
}
