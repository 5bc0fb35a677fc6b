//! Uniform `{code, message, data}` response envelope.
//!
//! Every successful API response is wrapped in exactly one [`ApiResponse`];
//! errors render the same shape through [`crate::errors::ErrorResponse`].
//!
//! ```ignore
//! use axum_helpers::envelope::{ApiResponse, ResultMessage};
//!
//! async fn handler() -> ApiResponse<bool> {
//!     ApiResponse::success(ResultMessage::CheckSuccess, true)
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed set of success outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultMessage {
    DetailSuccess,
    QuerySuccess,
    CreateSuccess,
    CheckSuccess,
    UpdateSuccess,
    DeleteSuccess,
}

impl ResultMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetailSuccess => "DETAIL_SUCCESS",
            Self::QuerySuccess => "QUERY_SUCCESS",
            Self::CreateSuccess => "CREATE_SUCCESS",
            Self::CheckSuccess => "CHECK_SUCCESS",
            Self::UpdateSuccess => "UPDATE_SUCCESS",
            Self::DeleteSuccess => "DELETE_SUCCESS",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::DetailSuccess => "Query detail succeeded",
            Self::QuerySuccess => "Query succeeded",
            Self::CreateSuccess => "Create succeeded",
            Self::CheckSuccess => "Check succeeded",
            Self::UpdateSuccess => "Update succeeded",
            Self::DeleteSuccess => "Delete succeeded",
        }
    }
}

impl std::fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Envelope carrying an operation payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Outcome identifier, e.g. `CREATE_SUCCESS`
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(result: ResultMessage, data: T) -> Self {
        Self {
            code: result.as_str().to_string(),
            message: result.message().to_string(),
            data: Some(data),
        }
    }

    /// Envelope answered with `201 Created` instead of `200 OK`.
    pub fn created(result: ResultMessage, data: T) -> (StatusCode, Self) {
        (StatusCode::CREATED, Self::success(result, data))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Envelope for outcomes without a payload; `data` is always `null`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub code: String,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

impl ApiMessage {
    pub fn new(result: ResultMessage) -> Self {
        Self {
            code: result.as_str().to_string(),
            message: result.message().to_string(),
            data: None,
        }
    }
}

impl From<ResultMessage> for ApiMessage {
    fn from(result: ResultMessage) -> Self {
        Self::new(result)
    }
}

impl IntoResponse for ApiMessage {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
