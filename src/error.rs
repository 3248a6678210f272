//! API error type.
//!
//! Every handler returns `Result<_, AppError>`. Responses carry the status and
//! a `{"detail": "..."}` body. Internal errors are logged and replaced with a
//! generic message.

use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::{DbLockError, StoreError};
use crate::learning::SessionError;
use crate::validation::ValidationError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct AppError {
    status: StatusCode,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::CONFLICT, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, message)
    }

    /// Logged server-side; the client only sees a generic message
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            is_operational: false,
        }
    }

    fn operational(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            is_operational: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = if self.is_operational {
            self.message
        } else {
            tracing::error!("{}", self.message);
            INTERNAL_ERROR_MESSAGE.to_string()
        };
        (self.status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        Self::internal(format!("Database error: {}", e))
    }
}

impl From<DbLockError> for AppError {
    fn from(e: DbLockError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::internal(format!("Progress store error: {}", e))
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::LessonNotFound(_) => Self::not_found(e.to_string()),
            SessionError::AnswerShapeMismatch => Self::bad_request(e.to_string()),
            _ => Self::conflict(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::Stage;

    #[test]
    fn test_session_error_status() {
        let missing: AppError = SessionError::LessonNotFound("L404".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message(), "Lesson not found");

        let wrong_stage: AppError = SessionError::NotInExercises(Stage::Vocabulary).into();
        assert_eq!(wrong_stage.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let e: AppError = ValidationError::PasswordTooShort.into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.message(), "Password must be at least 8 characters");
    }

    #[test]
    fn test_internal_error_hidden() {
        let response = AppError::internal("disk on fire").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
