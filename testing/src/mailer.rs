//! Recording mail transport.

use eventdesk_core::mail::Envelope;
use eventdesk_core::providers::Mailer;
use eventdesk_core::{DeskError, Result};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Mock mailer.
///
/// Records every envelope it accepts. Addresses registered with
/// [`fail_for`](Self::fail_for) are rejected with a transport error, which
/// lets tests exercise partial batch failures.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Envelope>>>,
    attempts: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    latency: Option<Duration>,
}

impl RecordingMailer {
    /// Create a mailer that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every send, to observe concurrent dispatch.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Reject mail to `address`.
    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into());
    }

    /// Envelopes accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every address a send was attempted for, accepted or not.
    #[must_use]
    pub fn attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, envelope: &Envelope) -> impl Future<Output = Result<()>> + Send {
        let sent = Arc::clone(&self.sent);
        let attempts = Arc::clone(&self.attempts);
        let failing = Arc::clone(&self.failing);
        let latency = self.latency;
        let envelope = envelope.clone();

        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            attempts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(envelope.to.clone());

            let rejected = failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&envelope.to);
            if rejected {
                return Err(DeskError::Mail(format!("recipient {} rejected", envelope.to)));
            }

            sent.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(envelope);
            Ok(())
        }
    }
}
