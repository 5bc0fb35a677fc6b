use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

use crate::models::UserId;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(UserId),

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UserError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::PasswordHash(msg) => {
                AppError::InternalServerError(format!("Password hash error: {}", msg))
            }
            UserError::Database(msg) => AppError::Database(msg),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (UserError::NotFound(42), StatusCode::NOT_FOUND),
            (
                UserError::DuplicateUsername("alice".to_string()),
                StatusCode::CONFLICT,
            ),
            (
                UserError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                UserError::Database("gone".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                UserError::PasswordHash("salt".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_not_found_message_names_user() {
        assert_eq!(UserError::NotFound(7).to_string(), "User 7 not found");
    }

    #[test]
    fn test_db_err_maps_to_database() {
        let err: UserError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, UserError::Database(ref msg) if msg.contains("boom")));
    }
}
