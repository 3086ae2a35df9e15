use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
///
/// Access Gate failures are terminal typed outcomes, never retried
/// server-side. Expired pastes are reported through `NotFound` before an
/// error is ever constructed, so expiration cannot leak existence.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The paste does not exist, has expired, or has been consumed.
    #[error("Paste not found")]
    NotFound,

    /// The caller may not see this paste.
    #[error("Forbidden")]
    Forbidden,

    /// The paste is password-gated and this session has not verified yet.
    #[error("Password required")]
    PasswordRequired,

    /// The submitted password did not match.
    #[error("Invalid password")]
    InvalidPassword,

    /// Password verification attempted against a paste with no password.
    #[error("Paste is not password protected")]
    NotPasswordProtected,

    /// A zero-knowledge paste arrived without a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Database error".to_string(),
                )
            }

            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Migration error".to_string(),
                )
            }

            AppError::Redis(ref e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Session store error".to_string(),
                )
            }

            AppError::NotFound => {
                tracing::debug!("Paste not found");
                (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "Paste not found".to_string(),
                )
            }

            AppError::Forbidden => {
                tracing::warn!("Access to paste forbidden");
                (StatusCode::FORBIDDEN, "forbidden", "Forbidden".to_string())
            }

            AppError::PasswordRequired => {
                tracing::debug!("Password required");
                (
                    StatusCode::UNAUTHORIZED,
                    "password_required",
                    "This paste is password protected".to_string(),
                )
            }

            AppError::InvalidPassword => {
                tracing::debug!("Invalid paste password submitted");
                (
                    StatusCode::UNAUTHORIZED,
                    "invalid_password",
                    "Invalid password".to_string(),
                )
            }

            AppError::NotPasswordProtected => {
                tracing::debug!("Password verification against unprotected paste");
                (
                    StatusCode::BAD_REQUEST,
                    "not_password_protected",
                    "This paste is not password protected".to_string(),
                )
            }

            AppError::MalformedEnvelope(ref msg) => {
                tracing::debug!("Malformed envelope: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "malformed_envelope",
                    msg.clone(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, "validation", msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message,
            "code": code,
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error","code":"internal"}"#.to_string());

        (status, body).into_response()
    }
}
