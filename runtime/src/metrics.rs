//! Prometheus metrics for observability and monitoring.
//!
//! Metric names recorded across the workspace:
//! - Store: commands, reducer latency, executed effects
//! - Selection and attendance: toggles, check-ins, duplicate scans
//! - Mail: delivered and failed messages
//! - Certificates: rendered and failed certificates
//!
//! # Example
//!
//! ```rust,no_run
//! use eventdesk_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Serve `server.render()` from GET /metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder and renderer.
///
/// Installs the global recorder; the server binary exposes [`render`](Self::render)
/// on `addr` for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server for `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should listen on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed (e.g. by an earlier test) is only warned about.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this server.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Actions sent to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers"
    );
    describe_counter!("store.effects.executed", "Effects executed, by type");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected during shutdown"
    );

    describe_counter!(
        "store.participants.writes",
        "Writes against the participant store, by operation"
    );

    // Selection and attendance
    describe_counter!(
        "desk.selection.toggles",
        "Selection changes that flipped a participant"
    );
    describe_counter!("desk.attendance.marked", "Participants marked as attended");
    describe_counter!(
        "desk.attendance.duplicates",
        "Check-ins rejected because the participant already attended"
    );

    // Mail
    describe_counter!("desk.mail.sent", "Messages accepted by the mail transport");
    describe_counter!("desk.mail.failed", "Messages the mail transport rejected");
    describe_histogram!(
        "desk.mail.batch.duration_seconds",
        "Time to settle a bulk mail batch"
    );

    // Certificates
    describe_counter!("desk.certificates.rendered", "Certificates rendered and stored");
    describe_counter!("desk.certificates.failed", "Certificates that failed to render or store");
    describe_histogram!(
        "desk.certificates.render.duration_seconds",
        "Time to composite one certificate"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_render_before_start_is_none() {
        let server = MetricsServer::new("127.0.0.1:9100".parse().unwrap());
        assert!(server.render().is_none());
        assert_eq!(server.addr().port(), 9100);
    }
}
