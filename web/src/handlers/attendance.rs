//! QR-scan lookup and check-in.
//!
//! Outcomes are matched on an id minted per dispatch, never on the client's
//! `X-Correlation-ID`.

use crate::error::AppError;
use crate::extractors::{AuthenticatedOrganizer, CorrelationId};
use crate::handlers::json_body;
use crate::state::{AppState, Services};
use axum::extract::{rejection::JsonRejection, Query, State};
use axum::Json;
use eventdesk_core::attendance::{AttendanceAction, CheckInRecord};
use eventdesk_core::{DeskError, Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query of `GET /api/attendance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanQuery {
    /// Decoded QR payload (the participant id).
    pub qr_result: Option<String>,
}

/// Body of `POST /api/attendance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    /// Decoded QR payload (the participant id).
    pub qr_result: Option<String>,
    /// Scan time reported by the device.
    pub qr_result_timestamp: Option<String>,
    /// Name the scanning device believes it is signed in as.
    pub user_name: Option<String>,
}

/// A successful check-in.
#[derive(Debug, Serialize)]
pub struct MarkResponse {
    /// Confirmation shown to door staff.
    pub message: &'static str,
    /// The updated record.
    pub participant: Participant,
}

fn scanned_id(qr_result: Option<&str>) -> Result<ParticipantId, AppError> {
    let raw = qr_result.ok_or_else(|| AppError::bad_request("Missing required field: qrResult"))?;
    Ok(ParticipantId::parse(raw)?)
}

async fn dispatch<D: Services>(
    state: &AppState<D>,
    action: impl FnOnce(Uuid) -> AttendanceAction,
) -> Result<AttendanceAction, AppError> {
    let correlation_id = Uuid::new_v4();
    let action = action(correlation_id);
    tracing::debug!(dispatch_id = %correlation_id, "Dispatching attendance action");

    let outcome = state
        .attendance
        .send_and_wait_for(
            action,
            move |a| a.correlation_id() == correlation_id && a.is_outcome(),
            state.store_timeout,
        )
        .await?;

    match outcome {
        AttendanceAction::ParticipantMissing { participant_id, .. } => {
            Err(DeskError::participant_not_found(&participant_id).into())
        },
        AttendanceAction::StoreFailed { error, .. } => Err(error.into()),
        other => Ok(other),
    }
}

/// `GET /api/attendance?qrResult=`
///
/// Read-only lookup so door staff can confirm who they scanned.
///
/// # Errors
///
/// 400 for a missing or blank `qrResult`, 404 for an unknown id.
pub async fn lookup<D: Services>(
    State(state): State<AppState<D>>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<Participant>, AppError> {
    let participant_id = scanned_id(query.qr_result.as_deref())?;

    match dispatch(&state, |correlation_id| AttendanceAction::Lookup {
        correlation_id,
        participant_id,
    })
    .await?
    {
        AttendanceAction::ParticipantFound { participant, .. } => Ok(Json(participant)),
        _ => Err(AppError::internal("Unexpected attendance outcome")),
    }
}

/// `POST /api/attendance`
///
/// Marks the participant as attended, recording the scan time and the
/// authenticated organizer. Only the first scan is recorded; later scans
/// get 409 and leave the stored record untouched.
///
/// # Errors
///
/// 400 for missing fields or a `userName` that is not the authenticated
/// organizer, 404 for an unknown id, 409 for a repeat scan.
#[tracing::instrument(skip(state, correlation_id, organizer, payload), fields(correlation_id = %correlation_id.0))]
pub async fn mark<D: Services>(
    State(state): State<AppState<D>>,
    correlation_id: CorrelationId,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    payload: Result<Json<MarkRequest>, JsonRejection>,
) -> Result<Json<MarkResponse>, AppError> {
    let request = json_body(payload)?;
    let participant_id = scanned_id(request.qr_result.as_deref())?;
    let scanned_at = request
        .qr_result_timestamp
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing required field: qrResultTimestamp"))?;

    if let Some(claimed) = request.user_name.as_deref().map(str::trim) {
        if !claimed.is_empty() && claimed != organizer.name {
            tracing::warn!(
                claimed,
                organizer = %organizer.name,
                "Scan claimed a different organizer"
            );
            return Err(AppError::bad_request(
                "userName does not match the authenticated organizer",
            ));
        }
    }

    let outcome = dispatch(&state, |correlation_id| AttendanceAction::Mark {
        correlation_id,
        participant_id,
        scanned_at,
        marked_by: organizer.name,
    })
    .await?;

    match outcome {
        AttendanceAction::Marked { participant, .. } => Ok(Json(MarkResponse {
            message: "Attendance marked successfully",
            participant,
        })),
        AttendanceAction::AlreadyAttended { participant, .. } => {
            let first = format!(
                "Checked in at {} by {}",
                participant.timestamp.as_deref().unwrap_or("an unknown time"),
                participant.marked_by.as_deref().unwrap_or("an unknown organizer"),
            );
            Err(AppError::from(DeskError::AlreadyAttended(participant.id)).with_detail(first))
        },
        _ => Err(AppError::internal("Unexpected attendance outcome")),
    }
}

/// `GET /api/attendance/recent`
///
/// Check-ins recorded by this process, newest first.
pub async fn recent<D: Services>(State(state): State<AppState<D>>) -> Json<Vec<CheckInRecord>> {
    Json(
        state
            .attendance
            .state(|s| s.recent.iter().cloned().collect())
            .await,
    )
}
