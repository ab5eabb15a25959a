//! # EventDesk Mailer
//!
//! Acceptance and rejection mail for selected and rejected applicants.
//!
//! - [`MailTemplates`]: plain-text and HTML bodies with `$username` and QR placeholders
//! - [`QrImageLinks`]: QR image URLs for acceptance mail
//! - [`BulkMailer`]: validates a request and sends every message, settling all
//! - Transports: [`SmtpMailer`] (lettre relay), [`ConsoleMailer`] (logs only)
//!   and [`ConfiguredMailer`] to choose between them at startup

pub mod batch;
pub mod console;
pub mod qr;
pub mod smtp;
pub mod templates;
pub mod transport;

pub use batch::BulkMailer;
pub use console::ConsoleMailer;
pub use qr::QrImageLinks;
pub use smtp::{SmtpMailer, SmtpSecurity, SmtpSettings};
pub use templates::{MailTemplate, MailTemplates};
pub use transport::ConfiguredMailer;
