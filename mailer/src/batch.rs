//! Settle-all bulk sends.

use crate::qr::QrImageLinks;
use crate::templates::MailTemplates;
use eventdesk_core::mail::{BatchReport, BulkMailRequest, Envelope, MailKind};
use eventdesk_core::providers::Mailer;
use eventdesk_core::Result;
use futures::future::join_all;
use std::time::Instant;

/// Sends acceptance and rejection mail in bulk.
///
/// Every recipient is sent concurrently and independently: one failure
/// never stops the others, and nothing is retried. The request is fully
/// validated before the first message goes out.
#[derive(Clone, Debug)]
pub struct BulkMailer<M> {
    mailer: M,
    templates: MailTemplates,
    qr_links: QrImageLinks,
    default_subject: String,
}

impl<M: Mailer> BulkMailer<M> {
    /// Bulk mailer for `event_name`, using the built-in templates.
    ///
    /// The default subject is `"<event_name> Registration"`.
    #[must_use]
    pub fn new(mailer: M, event_name: &str, qr_links: QrImageLinks) -> Self {
        Self {
            mailer,
            templates: MailTemplates::for_event(event_name),
            qr_links,
            default_subject: format!("{event_name} Registration"),
        }
    }

    /// Replace the built-in templates.
    #[must_use]
    pub fn with_templates(mut self, templates: MailTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Subject used when a request does not override it.
    #[must_use]
    pub fn default_subject(&self) -> &str {
        &self.default_subject
    }

    /// Validate `request` and build one envelope per recipient.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Validation`](eventdesk_core::DeskError::Validation)
    /// when the recipient arrays are empty or their lengths disagree.
    pub fn envelopes(&self, kind: MailKind, request: &BulkMailRequest) -> Result<Vec<Envelope>> {
        let subject = request.subject_or(&self.default_subject);

        Ok(request
            .recipients(kind)?
            .iter()
            .map(|recipient| {
                let qr_url = recipient
                    .participant_id
                    .as_ref()
                    .map(|id| self.qr_links.url_for(id));
                self.templates
                    .envelope(kind, recipient, &subject, qr_url.as_deref())
            })
            .collect())
    }

    /// Send `kind` mail to every recipient in `request`.
    ///
    /// # Errors
    ///
    /// Only validation errors are returned; delivery failures are collected
    /// in the [`BatchReport`].
    #[tracing::instrument(skip(self, request), fields(kind = kind.as_str(), recipients = request.to.len()))]
    pub async fn send_batch(&self, kind: MailKind, request: &BulkMailRequest) -> Result<BatchReport> {
        let envelopes = self.envelopes(kind, request)?;
        let started = Instant::now();

        let outcomes = join_all(envelopes.iter().map(|envelope| self.mailer.send(envelope))).await;

        let mut report = BatchReport::default();
        for (envelope, outcome) in envelopes.iter().zip(outcomes) {
            match outcome {
                Ok(()) => {
                    metrics::counter!("desk.mail.sent", "kind" => kind.as_str()).increment(1);
                    report.record_success();
                },
                Err(error) => {
                    metrics::counter!("desk.mail.failed", "kind" => kind.as_str()).increment(1);
                    tracing::warn!(recipient = %envelope.to, error = %error, "Email delivery failed");
                    report.record_failure(envelope.to.clone(), &error);
                },
            }
        }

        metrics::histogram!("desk.mail.batch.duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Bulk mail batch settled"
        );

        Ok(report)
    }
}
