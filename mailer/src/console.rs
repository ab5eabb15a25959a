//! Console transport for development.

use eventdesk_core::mail::Envelope;
use eventdesk_core::providers::Mailer;
use eventdesk_core::Result;
use std::future::Future;

/// Logs every message instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    /// Create a console mailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Mailer for ConsoleMailer {
    fn send(&self, envelope: &Envelope) -> impl Future<Output = Result<()>> + Send {
        tracing::info!(
            to = %envelope.to,
            subject = %envelope.subject,
            body = %envelope.text,
            "📧 Email (development mode, not sent)"
        );
        std::future::ready(Ok(()))
    }
}
