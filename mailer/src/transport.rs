//! Transport selected at startup.

use crate::console::ConsoleMailer;
use crate::smtp::SmtpMailer;
use eventdesk_core::mail::Envelope;
use eventdesk_core::providers::Mailer;
use eventdesk_core::Result;
use futures::future::Either;
use std::future::Future;

/// The mail transport the server was configured with.
#[derive(Clone, Debug)]
pub enum ConfiguredMailer {
    /// Real delivery through an SMTP relay.
    Smtp(SmtpMailer),
    /// Log-only delivery.
    Console(ConsoleMailer),
}

impl ConfiguredMailer {
    /// Transport name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Console(_) => "console",
        }
    }
}

impl Mailer for ConfiguredMailer {
    fn send(&self, envelope: &Envelope) -> impl Future<Output = Result<()>> + Send {
        match self {
            Self::Smtp(mailer) => Either::Left(mailer.send(envelope)),
            Self::Console(mailer) => Either::Right(mailer.send(envelope)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_transport_accepts_everything() {
        let mailer = ConfiguredMailer::Console(ConsoleMailer::new());
        let envelope = Envelope {
            to: "ada@example.com".into(),
            subject: "Hello".into(),
            text: "Hi".into(),
            html: "<p>Hi</p>".into(),
        };

        assert_eq!(mailer.name(), "console");
        mailer.send(&envelope).await.unwrap();
    }
}
