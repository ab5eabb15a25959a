//! Error taxonomy shared by every EventDesk component.
//!
//! Errors fall into three groups that map directly onto HTTP responses:
//! client mistakes (validation), missing records, and downstream failures
//! (database, mail relay, object storage, image rendering).

use crate::participant::ParticipantId;
use thiserror::Error;

/// Result alias used throughout the domain crates.
pub type Result<T> = std::result::Result<T, DeskError>;

/// EventDesk domain error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    // ═══════════════════════════════════════════════════════════════════════
    // Client errors
    // ═══════════════════════════════════════════════════════════════════════
    /// Malformed or inconsistent input (mismatched arrays, wrong file type).
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of record (e.g. "Participant").
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A second check-in for a participant who already attended.
    #[error("Participant {0} has already been marked as attended")]
    AlreadyAttended(ParticipantId),

    // ═══════════════════════════════════════════════════════════════════════
    // Downstream failures
    // ═══════════════════════════════════════════════════════════════════════
    /// Participant store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Mail relay failure.
    #[error("Mail delivery failed: {0}")]
    Mail(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Certificate rendering failure.
    #[error("Rendering failed: {0}")]
    Rendering(String),
}

impl DeskError {
    /// Build a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a not-found error for a participant.
    #[must_use]
    pub fn participant_not_found(id: &ParticipantId) -> Self {
        Self::NotFound {
            resource: "Participant",
            id: id.to_string(),
        }
    }

    /// Whether the caller, rather than a collaborating service, is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::AlreadyAttended(_)
        )
    }
}
