//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_database::{AuthError, ChatError, ScheduleError};
use serde_json::json;
use thiserror::Error;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::DatabaseError(_) | GatewayError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<ScheduleError> for GatewayError {
    fn from(error: ScheduleError) -> Self {
        match error {
            ScheduleError::InvalidSchedule(_)
            | ScheduleError::InvalidPattern(_)
            | ScheduleError::MissingLocation
            | ScheduleError::EmptyContent
            | ScheduleError::InvalidState => GatewayError::InvalidRequest(error.to_string()),
            ScheduleError::Unauthorized => {
                GatewayError::AuthorizationFailed("not the sender of this entry".to_string())
            }
            ScheduleError::NotFound => {
                GatewayError::NotFound("scheduled message not found".to_string())
            }
            ScheduleError::Dispatch(msg) => GatewayError::InternalError(msg),
            ScheduleError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::SessionNotFound | AuthError::SessionExpired => {
                GatewayError::AuthenticationFailed(error.to_string())
            }
            AuthError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<ChatError> for GatewayError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::MessageNotFound | ChatError::MemberNotFound => {
                GatewayError::NotFound(error.to_string())
            }
            ChatError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}
