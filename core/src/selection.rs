//! Selection toggling and the selected-participant counter.
//!
//! The reducer never touches the counter itself. Every toggle goes through
//! [`ParticipantRepository::set_selection`], which writes the participant
//! flag and the counter in one transaction; the reducer only caches the
//! latest value the store reported so the live view can be served without a
//! round-trip.

use crate::effect::Effect;
use crate::error::DeskError;
use crate::participant::{Participant, ParticipantId};
use crate::providers::ParticipantRepository;
use crate::reducer::Reducer;
use smallvec::{smallvec, SmallVec};
use uuid::Uuid;

/// Cached counter state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Last counter value reported by the store (`None` until first load).
    pub count: Option<u64>,
    /// Toggles that actually changed a participant since startup.
    pub toggles_applied: u64,
    /// Most recent downstream failure, cleared by the next success.
    pub last_error: Option<String>,
}

/// Selection actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    // Commands
    /// Set a participant's selection flag.
    SetSelection {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Participant to update.
        participant_id: ParticipantId,
        /// Target value.
        selected: bool,
    },
    /// Read the counter from the store.
    LoadCount {
        /// Request correlation id.
        correlation_id: Uuid,
    },
    /// Rebuild the counter from participant records.
    Recount {
        /// Request correlation id.
        correlation_id: Uuid,
    },

    // Effect results
    /// The toggle was applied (or was already in effect).
    SelectionApplied {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The participant after the write.
        participant: Participant,
        /// Whether the flag actually flipped.
        changed: bool,
        /// Counter after the write.
        count: u64,
    },
    /// No participant with that id.
    SelectionRejected {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The unknown id.
        participant_id: ParticipantId,
    },
    /// Counter value read or rebuilt.
    CountLoaded {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Counter value.
        count: u64,
    },
    /// The store failed.
    SelectionFailed {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Underlying error.
        error: DeskError,
    },
}

impl SelectionAction {
    /// Correlation id carried by every variant.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        match self {
            Self::SetSelection { correlation_id, .. }
            | Self::LoadCount { correlation_id }
            | Self::Recount { correlation_id }
            | Self::SelectionApplied { correlation_id, .. }
            | Self::SelectionRejected { correlation_id, .. }
            | Self::CountLoaded { correlation_id, .. }
            | Self::SelectionFailed { correlation_id, .. } => *correlation_id,
        }
    }

    /// Whether this action ends a request.
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::SelectionApplied { .. }
                | Self::SelectionRejected { .. }
                | Self::CountLoaded { .. }
                | Self::SelectionFailed { .. }
        )
    }

    /// The counter value this action reports, if any.
    #[must_use]
    pub const fn reported_count(&self) -> Option<u64> {
        match self {
            Self::SelectionApplied { count, .. } | Self::CountLoaded { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// Dependencies of the selection reducer.
#[derive(Clone)]
pub struct SelectionEnvironment<P>
where
    P: ParticipantRepository + Clone,
{
    /// Participant store.
    pub participants: P,
}

impl<P> SelectionEnvironment<P>
where
    P: ParticipantRepository + Clone,
{
    /// Create a new environment.
    #[must_use]
    pub const fn new(participants: P) -> Self {
        Self { participants }
    }
}

/// Reducer for selection toggles.
#[derive(Clone, Debug)]
pub struct SelectionReducer<P> {
    _phantom: std::marker::PhantomData<P>,
}

impl<P> SelectionReducer<P> {
    /// Create a new selection reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<P> Default for SelectionReducer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Reducer for SelectionReducer<P>
where
    P: ParticipantRepository + Clone + 'static,
{
    type State = SelectionState;
    type Action = SelectionAction;
    type Environment = SelectionEnvironment<P>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // SetSelection: flag + counter in one repository call
            // ═══════════════════════════════════════════════════════════════
            SelectionAction::SetSelection {
                correlation_id,
                participant_id,
                selected,
            } => {
                let participants = env.participants.clone();

                smallvec![Effect::future(async move {
                    Some(
                        match participants.set_selection(&participant_id, selected).await {
                            Ok(change) => SelectionAction::SelectionApplied {
                                correlation_id,
                                participant: change.participant,
                                changed: change.changed,
                                count: change.count,
                            },
                            Err(DeskError::NotFound { .. }) => SelectionAction::SelectionRejected {
                                correlation_id,
                                participant_id,
                            },
                            Err(error) => {
                                tracing::error!(
                                    %correlation_id,
                                    participant_id = %participant_id,
                                    selected,
                                    error = %error,
                                    "Failed to update selection"
                                );
                                SelectionAction::SelectionFailed {
                                    correlation_id,
                                    error,
                                }
                            },
                        },
                    )
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // LoadCount / Recount: read or rebuild the counter
            // ═══════════════════════════════════════════════════════════════
            SelectionAction::LoadCount { correlation_id } => {
                let participants = env.participants.clone();
                smallvec![Effect::future(async move {
                    Some(count_result(
                        correlation_id,
                        participants.selection_count().await,
                    ))
                })]
            },

            SelectionAction::Recount { correlation_id } => {
                let participants = env.participants.clone();
                smallvec![Effect::future(async move {
                    let result = participants.recount_selection().await;
                    if let Ok(count) = result {
                        tracing::info!(%correlation_id, count, "Selection counter rebuilt");
                    }
                    Some(count_result(correlation_id, result))
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // Results
            // ═══════════════════════════════════════════════════════════════
            SelectionAction::SelectionApplied {
                participant,
                changed,
                count,
                ..
            } => {
                state.count = Some(count);
                state.last_error = None;
                if changed {
                    state.toggles_applied += 1;
                    metrics::counter!(
                        "desk.selection.toggles",
                        "selected" => participant.selected.to_string()
                    )
                    .increment(1);
                }
                tracing::debug!(
                    participant_id = %participant.id,
                    selected = participant.selected,
                    changed,
                    count,
                    "Selection applied"
                );
                smallvec![Effect::None]
            },

            SelectionAction::CountLoaded { count, .. } => {
                state.count = Some(count);
                state.last_error = None;
                smallvec![Effect::None]
            },

            SelectionAction::SelectionRejected { participant_id, .. } => {
                tracing::warn!(participant_id = %participant_id, "Selection for unknown participant");
                smallvec![Effect::None]
            },

            SelectionAction::SelectionFailed { error, .. } => {
                state.last_error = Some(error.to_string());
                smallvec![Effect::None]
            },
        }
    }
}

fn count_result(correlation_id: Uuid, result: crate::Result<u64>) -> SelectionAction {
    match result {
        Ok(count) => SelectionAction::CountLoaded {
            correlation_id,
            count,
        },
        Err(error) => {
            tracing::error!(%correlation_id, error = %error, "Failed to read selection counter");
            SelectionAction::SelectionFailed {
                correlation_id,
                error,
            }
        },
    }
}
