//! SMTP transport using Lettre.

use eventdesk_core::mail::Envelope;
use eventdesk_core::providers::Mailer;
use eventdesk_core::{DeskError, Result};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use std::future::Future;

/// How the connection to the relay is secured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Plain greeting upgraded with `STARTTLS` (submission, port 587).
    StartTls,
    /// TLS from the first byte (port 465).
    ImplicitTls,
}

impl SmtpSecurity {
    /// The mode a relay listening on `port` expects.
    #[must_use]
    pub const fn for_port(port: u16) -> Self {
        match port {
            465 => Self::ImplicitTls,
            _ => Self::StartTls,
        }
    }
}

/// Connection and sender settings for [`SmtpMailer`].
#[derive(Clone)]
pub struct SmtpSettings {
    /// Relay host, e.g. `smtp.gmail.com`.
    pub host: String,
    /// Relay port (587 for STARTTLS, 465 for implicit TLS).
    pub port: u16,
    /// Authentication username.
    pub username: String,
    /// Authentication password or app password.
    pub password: String,
    /// Sender address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Sends real mail through an authenticated TLS relay.
///
/// The transport is built once; Lettre's SMTP transport is blocking, so
/// each send runs on the blocking thread pool.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a mailer from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Mail`] if the relay host or sender address is invalid.
    pub fn new(settings: SmtpSettings) -> Result<Self> {
        let address: Address = settings
            .from_email
            .parse()
            .map_err(|e| DeskError::Mail(format!("Invalid from address: {e}")))?;
        let from = Mailbox::new(Some(settings.from_name), address);

        let security = SmtpSecurity::for_port(settings.port);
        let builder = match security {
            SmtpSecurity::StartTls => SmtpTransport::starttls_relay(&settings.host),
            SmtpSecurity::ImplicitTls => SmtpTransport::relay(&settings.host),
        };
        let transport = builder
            .map_err(|e| DeskError::Mail(format!("SMTP relay error: {e}")))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            security = ?security,
            "SMTP transport configured"
        );

        Ok(Self { transport, from })
    }

    fn build_message(&self, envelope: &Envelope) -> Result<Message> {
        let to: Mailbox = envelope
            .to
            .parse()
            .map_err(|e| DeskError::Mail(format!("Invalid to address: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(envelope.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                envelope.text.clone(),
                envelope.html.clone(),
            ))
            .map_err(|e| DeskError::Mail(format!("Failed to build email: {e}")))
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, envelope: &Envelope) -> impl Future<Output = Result<()>> + Send {
        let message = self.build_message(envelope);
        let transport = self.transport.clone();

        async move {
            let message = message?;
            tokio::task::spawn_blocking(move || {
                transport
                    .send(&message)
                    .map_err(|e| DeskError::Mail(format!("Failed to send email: {e}")))
            })
            .await
            .map_err(|e| DeskError::Mail(format!("Email task failed: {e}")))?
            .map(|_| ())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: "desk".into(),
            password: "hunter2".into(),
            from_email: "desk@example.com".into(),
            from_name: "Event Desk".into(),
        }
    }

    fn envelope(to: &str) -> Envelope {
        Envelope {
            to: to.into(),
            subject: "RustConf Registration".into(),
            text: "Hi Ada".into(),
            html: "<p>Hi Ada</p>".into(),
        }
    }

    #[test]
    fn test_settings_debug_redacts_password() {
        let rendered = format!("{:?}", settings());
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_security_follows_port() {
        assert_eq!(SmtpSecurity::for_port(587), SmtpSecurity::StartTls);
        assert_eq!(SmtpSecurity::for_port(25), SmtpSecurity::StartTls);
        assert_eq!(SmtpSecurity::for_port(465), SmtpSecurity::ImplicitTls);
    }

    #[test]
    fn test_implicit_tls_relay_builds() {
        let mut settings = settings();
        settings.port = 465;
        assert!(SmtpMailer::new(settings).is_ok());
    }

    #[test]
    fn test_invalid_sender_is_rejected() {
        let mut settings = settings();
        settings.from_email = "not an address".into();
        assert!(matches!(SmtpMailer::new(settings), Err(DeskError::Mail(_))));
    }

    #[test]
    fn test_message_has_both_parts() {
        let mailer = SmtpMailer::new(settings()).unwrap();
        let message = mailer.build_message(&envelope("ada@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: RustConf Registration"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_without_connecting() {
        let mailer = SmtpMailer::new(settings()).unwrap();
        let err = mailer.send(&envelope("not-an-address")).await.unwrap_err();
        assert!(err.to_string().contains("Invalid to address"));
    }
}
