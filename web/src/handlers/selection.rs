//! Selection toggles and the selected-participant counter.
//!
//! Every request becomes a [`SelectionAction`] carrying a freshly minted id;
//! the handler waits for the outcome action with the same id. The client's
//! `X-Correlation-ID` only labels the request span, since two clients may
//! send the same one.

use crate::error::AppError;
use crate::extractors::{AuthenticatedOrganizer, CorrelationId};
use crate::handlers::json_body;
use crate::state::{AppState, Services};
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use eventdesk_core::selection::SelectionAction;
use eventdesk_core::{DeskError, Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `PUT /api/participants/:id/selection`.
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    /// Target value.
    pub selected: Option<bool>,
}

/// A toggle as seen by the organizer.
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// The participant after the write.
    pub participant: Participant,
    /// Whether the flag actually flipped.
    pub changed: bool,
    /// Counter after the write.
    pub count: u64,
}

/// Counter value.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// Number of selected participants.
    pub count: u64,
}

/// Build the action around a fresh dispatch id, send it and wait for its outcome.
async fn dispatch<D: Services>(
    state: &AppState<D>,
    action: impl FnOnce(Uuid) -> SelectionAction,
) -> Result<SelectionAction, AppError> {
    let correlation_id = Uuid::new_v4();
    let action = action(correlation_id);
    tracing::debug!(dispatch_id = %correlation_id, "Dispatching selection action");

    let outcome = state
        .selection
        .send_and_wait_for(
            action,
            move |a| a.correlation_id() == correlation_id && a.is_outcome(),
            state.store_timeout,
        )
        .await?;

    match outcome {
        SelectionAction::SelectionRejected { participant_id, .. } => {
            Err(DeskError::participant_not_found(&participant_id).into())
        },
        SelectionAction::SelectionFailed { error, .. } => Err(error.into()),
        other => Ok(other),
    }
}

fn count_of(outcome: &SelectionAction) -> Result<u64, AppError> {
    outcome
        .reported_count()
        .ok_or_else(|| AppError::internal("Unexpected selection outcome"))
}

/// `PUT /api/participants/:id/selection`
///
/// Flips the flag and the counter in one write. Setting the current value
/// again changes nothing and reports `changed: false`.
///
/// # Errors
///
/// 400 for a missing `selected`, 404 for an unknown participant.
#[tracing::instrument(skip(state, correlation_id, organizer, payload), fields(correlation_id = %correlation_id.0))]
pub async fn set_selection<D: Services>(
    State(state): State<AppState<D>>,
    correlation_id: CorrelationId,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
    Path(id): Path<String>,
    payload: Result<Json<SelectionRequest>, JsonRejection>,
) -> Result<Json<SelectionResponse>, AppError> {
    let participant_id = ParticipantId::parse(&id)?;
    let selected = json_body(payload)?
        .selected
        .ok_or_else(|| AppError::bad_request("Missing required field: selected"))?;

    let outcome = dispatch(&state, |correlation_id| SelectionAction::SetSelection {
        correlation_id,
        participant_id,
        selected,
    })
    .await?;

    let SelectionAction::SelectionApplied {
        participant,
        changed,
        count,
        ..
    } = outcome
    else {
        return Err(AppError::internal("Unexpected selection outcome"));
    };

    tracing::info!(
        participant_id = %participant.id,
        selected,
        changed,
        count,
        organizer = %organizer.name,
        "Selection updated"
    );

    Ok(Json(SelectionResponse {
        participant,
        changed,
        count,
    }))
}

/// `GET /api/selection`
///
/// # Errors
///
/// 500 when the store fails.
pub async fn count<D: Services>(
    State(state): State<AppState<D>>,
) -> Result<Json<CountResponse>, AppError> {
    let outcome = dispatch(&state, |correlation_id| SelectionAction::LoadCount {
        correlation_id,
    })
    .await?;

    Ok(Json(CountResponse {
        count: count_of(&outcome)?,
    }))
}

/// `POST /api/selection/recount`
///
/// Rebuilds the counter from the participant rows.
///
/// # Errors
///
/// 500 when the store fails.
#[tracing::instrument(skip(state, correlation_id, organizer), fields(correlation_id = %correlation_id.0))]
pub async fn recount<D: Services>(
    State(state): State<AppState<D>>,
    correlation_id: CorrelationId,
    AuthenticatedOrganizer(organizer): AuthenticatedOrganizer,
) -> Result<Json<CountResponse>, AppError> {
    let outcome = dispatch(&state, |correlation_id| SelectionAction::Recount {
        correlation_id,
    })
    .await?;
    let count = count_of(&outcome)?;

    tracing::info!(count, organizer = %organizer.name, "Selection counter rebuilt");
    Ok(Json(CountResponse { count }))
}
