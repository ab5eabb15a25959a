//! Bulk acceptance and rejection mail.

use crate::error::AppError;
use crate::extractors::AuthenticatedOrganizer;
use crate::handlers::json_body;
use crate::state::{AppState, Services};
use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use eventdesk_core::mail::{BatchReport, BulkMailRequest, DeliveryFailure, MailKind};
use serde::Serialize;

/// Outcome of a bulk send.
#[derive(Debug, Serialize)]
pub struct MailResponse {
    /// Summary line, e.g. "2 emails sent successfully, 1 failed."
    pub message: String,
    /// Messages accepted by the transport.
    pub succeeded: usize,
    /// Messages that failed.
    pub failed: usize,
    /// Per-recipient failure details.
    pub failures: Vec<DeliveryFailure>,
}

impl From<BatchReport> for MailResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            message: report.summary(),
            succeeded: report.succeeded,
            failed: report.failed,
            failures: report.failures,
        }
    }
}

async fn send<D: Services>(
    state: &AppState<D>,
    organizer: &str,
    kind: MailKind,
    payload: Result<Json<BulkMailRequest>, JsonRejection>,
) -> Result<Json<MailResponse>, AppError> {
    let request = json_body(payload)?;
    let report = state.mail.send_batch(kind, &request).await?;

    tracing::info!(
        kind = kind.as_str(),
        organizer,
        succeeded = report.succeeded,
        failed = report.failed,
        "Bulk mail settled"
    );

    Ok(Json(report.into()))
}

/// `POST /api/mail/selected`
///
/// Sends the acceptance mail, each with the participant's QR code.
/// Individual delivery failures are reported in the body, not as an error.
///
/// # Errors
///
/// 400 when `to`, `usernames` and `ids` are empty or of different lengths.
pub async fn send_selected<D: Services>(
    State(state): State<AppState<D>>,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    payload: Result<Json<BulkMailRequest>, JsonRejection>,
) -> Result<Json<MailResponse>, AppError> {
    send(&state, &organizer.name, MailKind::Selected, payload).await
}

/// `POST /api/mail/rejected`
///
/// # Errors
///
/// 400 when `to` and `usernames` are empty or of different lengths.
pub async fn send_rejected<D: Services>(
    State(state): State<AppState<D>>,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    payload: Result<Json<BulkMailRequest>, JsonRejection>,
) -> Result<Json<MailResponse>, AppError> {
    send(&state, &organizer.name, MailKind::Rejected, payload).await
}
