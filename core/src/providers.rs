//! Provider traits for the services EventDesk depends on.
//!
//! Reducers and services only see these traits; concrete implementations
//! live in `eventdesk-postgres` (participants), `eventdesk-mailer` (SMTP and
//! console transports) and `eventdesk-certificates` (local asset storage).
//! In-memory doubles live in `eventdesk-testing`.
//!
//! All methods return `impl Future + Send` so providers can be cloned into
//! `Effect::Future` closures and spawned on the runtime.

use crate::error::Result;
use crate::mail::Envelope;
use crate::participant::{
    AttendanceOutcome, CheckIn, Participant, ParticipantFilter, ParticipantId, SelectionChange,
};
use std::future::Future;

/// Participant store.
///
/// Owns the participant records and the selection counter. Implementations
/// must keep `selection_count()` equal to the number of selected
/// participants across every `set_selection` call.
pub trait ParticipantRepository: Send + Sync {
    /// List participants matching `filter`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`](crate::DeskError::Database) on storage failure.
    fn list(
        &self,
        filter: ParticipantFilter,
    ) -> impl Future<Output = Result<Vec<Participant>>> + Send;

    /// Fetch one participant.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`](crate::DeskError::Database) on storage failure.
    fn find(&self, id: &ParticipantId) -> impl Future<Output = Result<Option<Participant>>> + Send;

    /// Set the selection flag and adjust the counter in one atomic step.
    ///
    /// When the participant already has the requested value nothing is
    /// written and the current count is returned with `changed == false`.
    /// A missing counter is created with 1 on a select and 0 otherwise.
    ///
    /// # Errors
    ///
    /// - [`DeskError::NotFound`](crate::DeskError::NotFound) for an unknown id
    /// - [`DeskError::Database`](crate::DeskError::Database) on storage failure
    fn set_selection(
        &self,
        id: &ParticipantId,
        selected: bool,
    ) -> impl Future<Output = Result<SelectionChange>> + Send;

    /// Current counter value (0 if the counter has never been written).
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`](crate::DeskError::Database) on storage failure.
    fn selection_count(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Rebuild the counter from the participant records and return it.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`](crate::DeskError::Database) on storage failure.
    fn recount_selection(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Mark a participant as attended unless they already are.
    ///
    /// # Errors
    ///
    /// - [`DeskError::NotFound`](crate::DeskError::NotFound) for an unknown id
    /// - [`DeskError::Database`](crate::DeskError::Database) on storage failure
    fn mark_attendance(
        &self,
        id: &ParticipantId,
        check_in: &CheckIn,
    ) -> impl Future<Output = Result<AttendanceOutcome>> + Send;
}

/// Outbound mail transport.
pub trait Mailer: Send + Sync {
    /// Deliver a single message.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Mail`](crate::DeskError::Mail) if the message could
    /// not be built or the relay rejected it.
    fn send(&self, envelope: &Envelope) -> impl Future<Output = Result<()>> + Send;
}

/// Blob storage for templates, fonts and rendered certificates.
///
/// Keys are relative slash-separated paths such as `certificates/Ada.png`.
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Storage`](crate::DeskError::Storage) on failure.
    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the bytes stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Storage`](crate::DeskError::Storage) on failure.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;
}
