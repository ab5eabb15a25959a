//! Participant listing and lookup.

use crate::error::AppError;
use crate::state::{AppState, Services};
use axum::extract::{rejection::QueryRejection, Path, Query, State};
use axum::Json;
use eventdesk_core::providers::ParticipantRepository;
use eventdesk_core::{DeskError, Participant, ParticipantFilter, ParticipantId};

/// `GET /api/participants?selected=&attended=`
///
/// # Errors
///
/// 400 for an unparseable filter, 500 when the store fails.
#[tracing::instrument(skip(state, filter))]
pub async fn list<D: Services>(
    State(state): State<AppState<D>>,
    filter: Result<Query<ParticipantFilter>, QueryRejection>,
) -> Result<Json<Vec<Participant>>, AppError> {
    let Query(filter) = filter.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let participants = state.participants.list(filter).await?;
    tracing::debug!(count = participants.len(), ?filter, "Listed participants");

    Ok(Json(participants))
}

/// `GET /api/participants/:id`
///
/// # Errors
///
/// 400 for a blank id, 404 when no participant has it.
pub async fn get<D: Services>(
    State(state): State<AppState<D>>,
    Path(id): Path<String>,
) -> Result<Json<Participant>, AppError> {
    let id = ParticipantId::parse(&id)?;

    let participant = state
        .participants
        .find(&id)
        .await?
        .ok_or_else(|| DeskError::participant_not_found(&id))?;

    Ok(Json(participant))
}
