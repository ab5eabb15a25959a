//! Bulk mail requests, envelopes and batch results.
//!
//! A bulk request carries parallel arrays: addresses, display names and,
//! for acceptance mail, participant ids. [`BulkMailRequest::recipients`]
//! zips them after checking their lengths, so a malformed batch is rejected
//! before anything is sent.

use crate::error::{DeskError, Result};
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Placeholder replaced with the recipient's display name.
pub const USERNAME_PLACEHOLDER: &str = "$username";

/// Which decision the mail announces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailKind {
    /// Acceptance, with the participant's QR code.
    Selected,
    /// Rejection.
    Rejected,
}

impl MailKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::Rejected => "rejected",
        }
    }
}

/// Incoming bulk mail request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BulkMailRequest {
    /// Recipient addresses.
    #[serde(default)]
    pub to: Vec<String>,
    /// Display names, one per address.
    #[serde(default)]
    pub usernames: Vec<String>,
    /// Participant ids, one per address (acceptance mail only).
    #[serde(default)]
    pub ids: Vec<String>,
    /// Subject override.
    #[serde(default)]
    pub subject: Option<String>,
}

/// One validated recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    /// Address.
    pub email: String,
    /// Display name substituted for `$username`.
    pub username: String,
    /// Participant id, present for acceptance mail.
    pub participant_id: Option<ParticipantId>,
}

impl BulkMailRequest {
    /// Validate the parallel arrays and zip them into recipients.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`] when the recipient list is empty or
    /// when `usernames` (or `ids`, for [`MailKind::Selected`]) does not have
    /// one entry per address.
    pub fn recipients(&self, kind: MailKind) -> Result<Vec<Recipient>> {
        if self.to.is_empty() {
            return Err(DeskError::validation("Invalid recipient list"));
        }
        if self.usernames.len() != self.to.len() {
            return Err(DeskError::validation(
                "Usernames list does not match recipient list",
            ));
        }
        if kind == MailKind::Selected && self.ids.len() != self.to.len() {
            return Err(DeskError::validation(
                "Participant ids list does not match recipient list",
            ));
        }

        Ok(self
            .to
            .iter()
            .zip(&self.usernames)
            .enumerate()
            .map(|(index, (email, username))| Recipient {
                email: email.trim().to_string(),
                username: username.clone(),
                participant_id: match kind {
                    MailKind::Selected => self.ids.get(index).map(ParticipantId::new),
                    MailKind::Rejected => None,
                },
            })
            .collect())
    }

    /// The requested subject, or `default` when none (or a blank one) was given.
    #[must_use]
    pub fn subject_or(&self, default: &str) -> String {
        self.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

/// Replace every `$username` token in `template`.
#[must_use]
pub fn personalize(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, username)
}

/// A fully rendered message, ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// A single failed delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    /// Address that could not be reached.
    pub recipient: String,
    /// Transport error message.
    pub error: String,
}

/// Outcome of a settle-all batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Messages accepted by the transport.
    pub succeeded: usize,
    /// Messages that failed.
    pub failed: usize,
    /// Per-recipient failure details.
    pub failures: Vec<DeliveryFailure>,
}

impl BatchReport {
    /// Record a successful delivery.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record a failed delivery.
    pub fn record_failure(&mut self, recipient: impl Into<String>, error: &DeskError) {
        self.failed += 1;
        self.failures.push(DeliveryFailure {
            recipient: recipient.into(),
            error: error.to_string(),
        });
    }

    /// Human-readable summary shown to the organizer.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} emails sent successfully, {} failed.",
            self.succeeded, self.failed
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(to: &[&str], usernames: &[&str], ids: &[&str]) -> BulkMailRequest {
        BulkMailRequest {
            to: to.iter().map(ToString::to_string).collect(),
            usernames: usernames.iter().map(ToString::to_string).collect(),
            ids: ids.iter().map(ToString::to_string).collect(),
            subject: None,
        }
    }

    #[test]
    fn test_empty_recipient_list_is_rejected() {
        let err = request(&[], &[], &[]).recipients(MailKind::Rejected).unwrap_err();
        assert_eq!(err, DeskError::validation("Invalid recipient list"));
    }

    #[test]
    fn test_mismatched_usernames_are_rejected() {
        let err = request(&["a@x.io", "b@x.io"], &["A"], &[])
            .recipients(MailKind::Rejected)
            .unwrap_err();
        assert_eq!(
            err,
            DeskError::validation("Usernames list does not match recipient list")
        );
    }

    #[test]
    fn test_selected_mail_requires_ids() {
        let req = request(&["a@x.io"], &["A"], &[]);
        assert!(req.recipients(MailKind::Selected).is_err());
        assert!(req.recipients(MailKind::Rejected).is_ok());
    }

    #[test]
    fn test_recipients_are_zipped_in_order() {
        let recipients = request(&["a@x.io", " b@x.io "], &["A", "B"], &["1", "2"])
            .recipients(MailKind::Selected)
            .unwrap();

        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[1].email, "b@x.io");
        assert_eq!(recipients[1].username, "B");
        assert_eq!(recipients[1].participant_id, Some(ParticipantId::new("2")));
    }

    #[test]
    fn test_subject_falls_back_to_default() {
        let mut req = request(&["a@x.io"], &["A"], &[]);
        assert_eq!(req.subject_or("Registration"), "Registration");
        req.subject = Some("  ".into());
        assert_eq!(req.subject_or("Registration"), "Registration");
        req.subject = Some("Welcome".into());
        assert_eq!(req.subject_or("Registration"), "Welcome");
    }

    #[test]
    fn test_report_summary() {
        let mut report = BatchReport::default();
        report.record_success();
        report.record_success();
        report.record_failure("c@x.io", &DeskError::Mail("mailbox full".into()));

        assert_eq!(report.summary(), "2 emails sent successfully, 1 failed.");
        assert_eq!(report.failures[0].recipient, "c@x.io");
    }

    proptest! {
        #[test]
        fn personalize_leaves_no_placeholder(name in "[A-Za-z ]{1,20}") {
            let rendered = personalize("Hi $username, welcome $username!", &name);
            prop_assert!(!rendered.contains(USERNAME_PLACEHOLDER));
            prop_assert_eq!(rendered.matches(name.as_str()).count() >= 2, true);
        }
    }
}
