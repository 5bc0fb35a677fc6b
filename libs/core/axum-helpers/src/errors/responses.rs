//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": "INTERNAL_ERROR",
        "message": "An internal server error occurred",
        "data": null
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Validation Error",
    content_type = "application/json",
    example = json!({
        "code": "VALIDATION_ERROR",
        "message": "Request validation failed",
        "data": {
            "username": [{
                "code": "length",
                "message": null,
                "params": {"min": 1, "max": 64}
            }]
        }
    })
)]
pub struct BadRequestValidationResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - Invalid path parameter",
    content_type = "application/json",
    example = json!({
        "code": "INVALID_PATH_PARAM",
        "message": "Invalid identifier: abc",
        "data": null
    })
)]
pub struct BadRequestPathResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": "NOT_FOUND",
        "message": "Resource not found",
        "data": null
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Conflict - Resource already exists",
    content_type = "application/json",
    example = json!({
        "code": "CONFLICT",
        "message": "Resource already exists",
        "data": null
    })
)]
pub struct ConflictResponse(pub ErrorResponse);
