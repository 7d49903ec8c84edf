use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use wicket::WicketError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Wrong email or password")]
    InvalidCredentials,

    #[error("Too many failed login attempts")]
    LockedOut,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid session token")]
    InvalidSession,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<WicketError> for ApiError {
    fn from(err: WicketError) -> Self {
        match err {
            WicketError::InvalidCredentials => ApiError::InvalidCredentials,
            WicketError::LockedOut => ApiError::LockedOut,
            WicketError::ValidationError(msg) => ApiError::BadRequest(msg),
            WicketError::NotFound(msg) => ApiError::NotFound(msg),
            WicketError::Conflict(msg) => ApiError::Conflict(msg),
            WicketError::SessionError(_) => ApiError::InvalidSession,
            WicketError::StorageError(msg) | WicketError::CryptoError(msg) => {
                ApiError::InternalError(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidCredentials => (StatusCode::FORBIDDEN, "Wrong email or password"),
            ApiError::LockedOut => (StatusCode::FORBIDDEN, "Too many failed login attempts"),
            ApiError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            ApiError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            ApiError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::InvalidSession => (StatusCode::UNAUTHORIZED, "Invalid session"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            ApiError::InternalError(ref msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
