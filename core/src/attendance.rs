//! Attendance recording.
//!
//! Each participant moves `NOT_ATTENDED → ATTENDED` exactly once. The
//! repository write is conditional on the participant not having attended
//! yet, so a duplicate scan reports [`AttendanceAction::AlreadyAttended`]
//! and leaves the first check-in's timestamp and organizer in place.

use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::DeskError;
use crate::participant::{AttendanceOutcome, CheckIn, Participant, ParticipantId};
use crate::providers::ParticipantRepository;
use crate::reducer::Reducer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::{smallvec, SmallVec};
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// How many check-ins the recent list keeps.
pub const RECENT_CHECK_INS: usize = 50;

/// A check-in as shown on the door staff's recent list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRecord {
    /// Participant id.
    pub participant_id: ParticipantId,
    /// Participant name.
    pub name: String,
    /// Organizer who scanned.
    pub marked_by: String,
    /// Scan time reported by the device.
    pub scanned_at: String,
    /// Server time the check-in was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Attendance state for this process.
#[derive(Clone, Debug, Default)]
pub struct AttendanceState {
    /// Most recent check-ins, newest first.
    pub recent: VecDeque<CheckInRecord>,
    /// Participants marked since startup.
    pub marked_total: u64,
    /// Scans rejected because the participant had already attended.
    pub duplicate_scans: u64,
}

/// Attendance actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttendanceAction {
    // Commands
    /// Look up a scanned id without changing anything.
    Lookup {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Scanned id.
        participant_id: ParticipantId,
    },
    /// Mark a participant as attended.
    Mark {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Scanned id.
        participant_id: ParticipantId,
        /// Scan time reported by the device.
        scanned_at: String,
        /// Organizer performing the scan.
        marked_by: String,
    },

    // Effect results
    /// Lookup succeeded.
    ParticipantFound {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The stored record.
        participant: Participant,
    },
    /// The participant is now attended.
    Marked {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The updated record.
        participant: Participant,
    },
    /// The participant had already attended; nothing was written.
    AlreadyAttended {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The stored record.
        participant: Participant,
    },
    /// No participant with that id.
    ParticipantMissing {
        /// Request correlation id.
        correlation_id: Uuid,
        /// The unknown id.
        participant_id: ParticipantId,
    },
    /// The store failed.
    StoreFailed {
        /// Request correlation id.
        correlation_id: Uuid,
        /// Underlying error.
        error: DeskError,
    },
}

impl AttendanceAction {
    /// Correlation id carried by every variant.
    #[must_use]
    pub const fn correlation_id(&self) -> Uuid {
        match self {
            Self::Lookup { correlation_id, .. }
            | Self::Mark { correlation_id, .. }
            | Self::ParticipantFound { correlation_id, .. }
            | Self::Marked { correlation_id, .. }
            | Self::AlreadyAttended { correlation_id, .. }
            | Self::ParticipantMissing { correlation_id, .. }
            | Self::StoreFailed { correlation_id, .. } => *correlation_id,
        }
    }

    /// Whether this action ends a request.
    #[must_use]
    pub const fn is_outcome(&self) -> bool {
        !matches!(self, Self::Lookup { .. } | Self::Mark { .. })
    }
}

/// Dependencies of the attendance reducer.
#[derive(Clone)]
pub struct AttendanceEnvironment<P>
where
    P: ParticipantRepository + Clone,
{
    /// Participant store.
    pub participants: P,
    /// Clock for stamping check-in records.
    pub clock: Arc<dyn Clock>,
}

impl<P> AttendanceEnvironment<P>
where
    P: ParticipantRepository + Clone,
{
    /// Create a new environment.
    #[must_use]
    pub fn new(participants: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            participants,
            clock,
        }
    }
}

/// Reducer for attendance lookups and check-ins.
#[derive(Clone, Debug)]
pub struct AttendanceReducer<P> {
    _phantom: std::marker::PhantomData<P>,
}

impl<P> AttendanceReducer<P> {
    /// Create a new attendance reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<P> Default for AttendanceReducer<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Reducer for AttendanceReducer<P>
where
    P: ParticipantRepository + Clone + 'static,
{
    type State = AttendanceState;
    type Action = AttendanceAction;
    type Environment = AttendanceEnvironment<P>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Lookup: read-only
            // ═══════════════════════════════════════════════════════════════
            AttendanceAction::Lookup {
                correlation_id,
                participant_id,
            } => {
                let participants = env.participants.clone();
                smallvec![Effect::future(async move {
                    Some(match participants.find(&participant_id).await {
                        Ok(Some(participant)) => AttendanceAction::ParticipantFound {
                            correlation_id,
                            participant,
                        },
                        Ok(None) => AttendanceAction::ParticipantMissing {
                            correlation_id,
                            participant_id,
                        },
                        Err(error) => store_failed(correlation_id, &participant_id, error),
                    })
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // Mark: conditional NOT_ATTENDED → ATTENDED
            // ═══════════════════════════════════════════════════════════════
            AttendanceAction::Mark {
                correlation_id,
                participant_id,
                scanned_at,
                marked_by,
            } => {
                let participants = env.participants.clone();
                let check_in = CheckIn {
                    scanned_at,
                    marked_by,
                };
                smallvec![Effect::future(async move {
                    Some(
                        match participants.mark_attendance(&participant_id, &check_in).await {
                            Ok(AttendanceOutcome::Marked(participant)) => {
                                AttendanceAction::Marked {
                                    correlation_id,
                                    participant,
                                }
                            },
                            Ok(AttendanceOutcome::AlreadyAttended(participant)) => {
                                AttendanceAction::AlreadyAttended {
                                    correlation_id,
                                    participant,
                                }
                            },
                            Err(DeskError::NotFound { .. }) => {
                                AttendanceAction::ParticipantMissing {
                                    correlation_id,
                                    participant_id,
                                }
                            },
                            Err(error) => store_failed(correlation_id, &participant_id, error),
                        },
                    )
                })]
            },

            // ═══════════════════════════════════════════════════════════════
            // Results
            // ═══════════════════════════════════════════════════════════════
            AttendanceAction::Marked { participant, .. } => {
                state.marked_total += 1;
                state.recent.push_front(CheckInRecord {
                    participant_id: participant.id.clone(),
                    name: participant.name.clone(),
                    marked_by: participant.marked_by.clone().unwrap_or_default(),
                    scanned_at: participant.timestamp.clone().unwrap_or_default(),
                    recorded_at: env.clock.now(),
                });
                state.recent.truncate(RECENT_CHECK_INS);
                metrics::counter!("desk.attendance.marked").increment(1);
                tracing::info!(
                    participant_id = %participant.id,
                    marked_by = participant.marked_by.as_deref().unwrap_or_default(),
                    "Attendance marked"
                );
                smallvec![Effect::None]
            },

            AttendanceAction::AlreadyAttended { participant, .. } => {
                state.duplicate_scans += 1;
                metrics::counter!("desk.attendance.duplicates").increment(1);
                tracing::warn!(
                    participant_id = %participant.id,
                    first_marked_by = participant.marked_by.as_deref().unwrap_or_default(),
                    "Duplicate attendance scan rejected"
                );
                smallvec![Effect::None]
            },

            AttendanceAction::ParticipantMissing { participant_id, .. } => {
                tracing::warn!(participant_id = %participant_id, "Scanned id not found");
                smallvec![Effect::None]
            },

            AttendanceAction::ParticipantFound { .. } | AttendanceAction::StoreFailed { .. } => {
                smallvec![Effect::None]
            },
        }
    }
}

fn store_failed(
    correlation_id: Uuid,
    participant_id: &ParticipantId,
    error: DeskError,
) -> AttendanceAction {
    tracing::error!(
        %correlation_id,
        participant_id = %participant_id,
        error = %error,
        "Attendance store operation failed"
    );
    AttendanceAction::StoreFailed {
        correlation_id,
        error,
    }
}
