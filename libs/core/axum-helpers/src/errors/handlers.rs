use axum::response::Response;

use super::{ErrorCode, error_response};

/// Router fallback for unmatched paths.
pub async fn not_found() -> Response {
    error_response(ErrorCode::NotFound, ErrorCode::NotFound.default_message())
}

/// Fallback for paths that exist but not with this method.
pub async fn method_not_allowed() -> Response {
    error_response(
        ErrorCode::MethodNotAllowed,
        ErrorCode::MethodNotAllowed.default_message(),
    )
}
