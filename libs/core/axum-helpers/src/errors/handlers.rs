use axum::response::Response;

use super::{ErrorCode, error_response};

/// Fallback for unrouted paths.
pub async fn not_found() -> Response {
    error_response(
        ErrorCode::NotFound.status(),
        "The requested resource was not found".to_string(),
        ErrorCode::NotFound,
    )
}

/// Fallback for routed paths hit with an unsupported method.
pub async fn method_not_allowed() -> Response {
    error_response(
        ErrorCode::MethodNotAllowed.status(),
        ErrorCode::MethodNotAllowed.default_message().to_string(),
        ErrorCode::MethodNotAllowed,
    )
}
