//! Gateway types module
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`] / [`ApiResult<T>`]: Handler error side
//!
//! ## Submodules
//! - [`error`]: Handler error type
//! - [`response`]: Response types and error codes

pub mod error;
pub mod response;

pub use error::{ApiError, ApiResult, ok, with_status};
pub use response::{
    ApiResponse, StatusQuery, SubmitStatus, TransferAcceptedData, TransferDuplicateData,
    TransferStatusData, error_codes,
};
