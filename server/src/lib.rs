//! # EventDesk Server
//!
//! Wires the production providers (PostgreSQL, SMTP, local asset
//! directory) into the web layer. `main.rs` adds process concerns:
//! `.env` loading, tracing, metrics and graceful shutdown.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;

pub use config::{Config, ConfigError, MailTransport};

use anyhow::Context;
use eventdesk_certificates::{CertificateService, LocalAssetStore};
use eventdesk_core::environment::SystemClock;
use eventdesk_mailer::{BulkMailer, ConfiguredMailer, ConsoleMailer, QrImageLinks, SmtpMailer};
use eventdesk_postgres::PostgresParticipantRepository;
use eventdesk_web::{AppState, Services};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Providers used in production.
#[derive(Debug)]
pub struct Production;

impl Services for Production {
    type Participants = PostgresParticipantRepository;
    type Mailer = ConfiguredMailer;
    type Assets = LocalAssetStore;
}

/// Build the mail transport selected by `config`.
///
/// # Errors
///
/// Returns error if the SMTP relay settings are invalid.
pub fn build_mailer(config: &Config) -> anyhow::Result<ConfiguredMailer> {
    Ok(match &config.mail.transport {
        MailTransport::Smtp(settings) => {
            ConfiguredMailer::Smtp(SmtpMailer::new(settings.clone()).context("Invalid SMTP settings")?)
        },
        MailTransport::Console => ConfiguredMailer::Console(ConsoleMailer),
    })
}

/// Connect to the database, apply migrations and assemble the application state.
///
/// # Errors
///
/// Returns error if the database is unreachable, a migration fails, or the
/// mail or organizer configuration is invalid.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState<Production>> {
    let organizers = config.organizers()?;
    if organizers.is_empty() {
        tracing::warn!("ORGANIZER_TOKENS is empty; every /api request will be rejected");
    }

    tracing::info!(max_connections = config.database.max_connections, "Connecting to PostgreSQL");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let participants = PostgresParticipantRepository::new(pool);
    participants.migrate().await.context("Failed to run migrations")?;

    let mailer = build_mailer(config)?;
    tracing::info!(transport = mailer.name(), "Mail transport ready");

    let mail = BulkMailer::new(
        mailer,
        &config.mail.event_name,
        QrImageLinks::new(config.mail.qr_base_url.clone(), config.mail.qr_size),
    );
    let certificates = CertificateService::new(LocalAssetStore::new(config.assets_dir.clone()));

    Ok(AppState::new(
        participants,
        mail,
        certificates,
        organizers,
        Arc::new(SystemClock),
    )
    .with_store_timeout(config.store_timeout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_console_transport_is_selected() {
        let config = Config::from_lookup(|key| (key == "MAIL_TRANSPORT").then(|| "console".to_string()))
            .unwrap();
        assert_eq!(build_mailer(&config).unwrap().name(), "console");
    }

    #[test]
    fn test_smtp_transport_is_selected() {
        let config = Config::from_lookup(|key| match key {
            "SMTP_HOST" => Some("localhost".to_string()),
            "SMTP_USERNAME" => Some("desk@example.com".to_string()),
            "SMTP_PASSWORD" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(build_mailer(&config).unwrap().name(), "smtp");
    }
}
