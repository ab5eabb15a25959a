//! Error types for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every error is
//! rendered as `{"message": ..., "error"?: ...}`; `error` carries the
//! underlying cause for server-side failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eventdesk_auth::AuthError;
use eventdesk_core::DeskError;
use eventdesk_runtime::StoreError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Participant>, AppError> {
///     let participant = repo.find(&id).await?
///         .ok_or_else(|| AppError::not_found(format!("Participant not found: {id}")))?;
///     Ok(Json(participant))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// User-facing message
    message: String,
    /// Underlying cause, included in the body for 5xx responses
    detail: Option<String>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
            source: None,
        }
    }

    /// Attach the underlying cause, shown to the client as `error`.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// Create a 504 Gateway Timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable error message.
    message: String,
    /// Underlying cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            message: self.message,
            error: self.detail,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<DeskError> for AppError {
    fn from(err: DeskError) -> Self {
        let mapped = match &err {
            DeskError::Validation(message) => return Self::bad_request(message.clone()),
            DeskError::NotFound { .. } => return Self::not_found(err.to_string()),
            DeskError::AlreadyAttended(_) => return Self::conflict(err.to_string()),
            DeskError::Database(detail) => Self::internal("Database error").with_detail(detail.clone()),
            DeskError::Mail(detail) => Self::internal("Failed to send email").with_detail(detail.clone()),
            DeskError::Storage(detail) => Self::internal("Storage error").with_detail(detail.clone()),
            DeskError::Rendering(detail) => {
                Self::internal("Error generating certificate").with_detail(detail.clone())
            },
        };
        mapped.with_source(anyhow::Error::new(err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let mapped = match err {
            StoreError::Timeout => Self::timeout("Timed out waiting for the participant store"),
            StoreError::ShutdownInProgress | StoreError::ShutdownTimeout(_) => {
                Self::unavailable("Service is shutting down")
            },
            StoreError::ChannelClosed => Self::internal("Store channel closed"),
        };
        mapped.with_source(anyhow::Error::new(err))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => Self::unauthorized("Missing bearer token"),
            AuthError::InvalidCredentials | AuthError::InvalidEntry { .. } => {
                Self::unauthorized("Invalid or expired token")
            },
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use eventdesk_core::ParticipantId;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[test]
    fn test_domain_error_statuses() {
        let cases = [
            (DeskError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                DeskError::participant_not_found(&ParticipantId::new("x")),
                StatusCode::NOT_FOUND,
            ),
            (
                DeskError::AlreadyAttended(ParticipantId::new("x")),
                StatusCode::CONFLICT,
            ),
            (DeskError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (DeskError::Mail("relay".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_server_errors_carry_detail() {
        let err = AppError::from(DeskError::Database("connection refused".into()));
        assert_eq!(err.message(), "Database error");
        assert_eq!(err.detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_store_timeout_is_gateway_timeout() {
        assert_eq!(
            AppError::from(StoreError::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        assert_eq!(
            AppError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
