//! Participant records and the value types exchanged with the participant store.

use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique participant identifier.
///
/// Identifiers are assigned by the external registration flow and arrive
/// here verbatim, usually decoded from a QR code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an identifier without validation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an identifier received from a client.
    ///
    /// Surrounding whitespace (common in scanner output) is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] if the identifier is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DeskError::validation("Participant id is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A conference registrant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique identifier (also encoded in the participant's QR code).
    pub id: ParticipantId,
    /// Display name, used on certificates and in mail greetings.
    pub name: String,
    /// Contact address.
    pub email: String,
    /// Degree programme.
    #[serde(default)]
    pub degree: String,
    /// Department.
    #[serde(default)]
    pub department: String,
    /// Survey answer: relevant experience.
    #[serde(default)]
    pub experience_response: String,
    /// Survey answer: resilience.
    #[serde(default)]
    pub resilience_response: String,
    /// Survey answer: goals.
    #[serde(default)]
    pub goals_response: String,
    /// Whether the participant has checked in.
    #[serde(default)]
    pub attend: bool,
    /// Whether an organizer admitted the participant.
    #[serde(default)]
    pub selected: bool,
    /// Scan time recorded at check-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Organizer who recorded the check-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_by: Option<String>,
}

impl Participant {
    /// A freshly registered participant: not selected, not attended.
    #[must_use]
    pub fn new(id: ParticipantId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            degree: String::new(),
            department: String::new(),
            experience_response: String::new(),
            resilience_response: String::new(),
            goals_response: String::new(),
            attend: false,
            selected: false,
            timestamp: None,
            marked_by: None,
        }
    }

    /// Certificates go to participants who were selected and showed up.
    #[must_use]
    pub const fn is_certificate_eligible(&self) -> bool {
        self.attend && self.selected
    }

    /// Apply a check-in to this record.
    pub fn record_check_in(&mut self, check_in: &CheckIn) {
        self.attend = true;
        self.timestamp = Some(check_in.scanned_at.clone());
        self.marked_by = Some(check_in.marked_by.clone());
    }
}

/// The data written when a participant is marked as attended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckIn {
    /// Scan time as reported by the scanning device.
    pub scanned_at: String,
    /// Name of the organizer who scanned the code.
    pub marked_by: String,
}

/// Result of a conditional attendance write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttendanceOutcome {
    /// The participant transitioned to attended; carries the updated record.
    Marked(Participant),
    /// The participant was already attended; carries the stored record untouched.
    AlreadyAttended(Participant),
}

/// Result of a selection toggle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionChange {
    /// The participant after the write.
    pub participant: Participant,
    /// `false` when the participant already had the requested value.
    pub changed: bool,
    /// Counter value after the write.
    pub count: u64,
}

/// Listing filter for participants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantFilter {
    /// Only participants with this selection flag.
    #[serde(default)]
    pub selected: Option<bool>,
    /// Only participants with this attendance flag.
    #[serde(default)]
    pub attended: Option<bool>,
}

impl ParticipantFilter {
    /// Participants that should receive a certificate.
    #[must_use]
    pub const fn certificate_recipients() -> Self {
        Self {
            selected: Some(true),
            attended: Some(true),
        }
    }

    /// Whether `participant` passes this filter.
    #[must_use]
    pub fn matches(&self, participant: &Participant) -> bool {
        self.selected.is_none_or(|s| participant.selected == s)
            && self.attended.is_none_or(|a| participant.attend == a)
    }
}
