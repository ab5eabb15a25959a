//! Error types for organizer authentication.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Authentication failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Request Errors
    // ═══════════════════════════════════════════════════════════
    /// No bearer token on the request.
    #[error("Missing bearer token")]
    MissingToken,

    /// The token matches no configured organizer.
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ═══════════════════════════════════════════════════════════
    // Configuration Errors
    // ═══════════════════════════════════════════════════════════
    /// An organizer entry could not be parsed.
    #[error("Invalid organizer entry '{entry}': {reason}")]
    InvalidEntry {
        /// The offending entry.
        entry: String,
        /// What is wrong with it.
        reason: String,
    },
}
