//! In-memory participant repository.

use eventdesk_core::providers::ParticipantRepository;
use eventdesk_core::{
    AttendanceOutcome, CheckIn, DeskError, Participant, ParticipantFilter, ParticipantId, Result,
    SelectionChange,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    participants: BTreeMap<ParticipantId, Participant>,
    /// `None` models a counter document that was never written.
    counter: Option<u64>,
}

/// Mock participant store.
///
/// Mirrors the transactional semantics of the PostgreSQL store: the
/// selection flag and the counter change under one lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryParticipantRepository {
    inner: Arc<Mutex<Inner>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryParticipantRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository seeded with `participants`.
    ///
    /// The counter starts absent, as on a fresh deployment.
    #[must_use]
    pub fn with_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let repo = Self::new();
        for participant in participants {
            repo.insert(participant);
        }
        repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only happens after a panicking test; keep going.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Insert or replace a participant.
    pub fn insert(&self, participant: Participant) {
        self.lock()
            .participants
            .insert(participant.id.clone(), participant);
    }

    /// Snapshot of one participant.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Participant> {
        self.lock()
            .participants
            .get(&ParticipantId::new(id))
            .cloned()
    }

    /// Snapshot of every participant, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Participant> {
        self.lock().participants.values().cloned().collect()
    }

    /// Raw counter value (`None` if never written).
    #[must_use]
    pub fn counter(&self) -> Option<u64> {
        self.lock().counter
    }

    /// Overwrite the counter, e.g. to simulate drift.
    pub fn set_counter(&self, counter: Option<u64>) {
        self.lock().counter = counter;
    }

    /// Number of participants with `selected == true`.
    #[must_use]
    pub fn selected_count(&self) -> u64 {
        self.lock()
            .participants
            .values()
            .filter(|p| p.selected)
            .count() as u64
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeskError::Database("simulated write failure".into()));
        }
        Ok(())
    }
}

impl ParticipantRepository for InMemoryParticipantRepository {
    fn list(
        &self,
        filter: ParticipantFilter,
    ) -> impl Future<Output = Result<Vec<Participant>>> + Send {
        let mut participants: Vec<Participant> = self
            .lock()
            .participants
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        participants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        async move { Ok(participants) }
    }

    fn find(&self, id: &ParticipantId) -> impl Future<Output = Result<Option<Participant>>> + Send {
        let found = self.lock().participants.get(id).cloned();
        async move { Ok(found) }
    }

    fn set_selection(
        &self,
        id: &ParticipantId,
        selected: bool,
    ) -> impl Future<Output = Result<SelectionChange>> + Send {
        let result = self.check_writable().and_then(|()| {
            let mut inner = self.lock();
            let Inner {
                participants,
                counter,
            } = &mut *inner;

            let participant = participants
                .get_mut(id)
                .ok_or_else(|| DeskError::participant_not_found(id))?;

            if participant.selected == selected {
                return Ok(SelectionChange {
                    participant: participant.clone(),
                    changed: false,
                    count: counter.unwrap_or(0),
                });
            }

            participant.selected = selected;
            let next = match (*counter, selected) {
                (None, true) => 1,
                (None, false) => 0,
                (Some(count), true) => count + 1,
                (Some(count), false) => count.saturating_sub(1),
            };
            *counter = Some(next);

            Ok(SelectionChange {
                participant: participant.clone(),
                changed: true,
                count: next,
            })
        });

        async move { result }
    }

    fn selection_count(&self) -> impl Future<Output = Result<u64>> + Send {
        let count = self.lock().counter.unwrap_or(0);
        async move { Ok(count) }
    }

    fn recount_selection(&self) -> impl Future<Output = Result<u64>> + Send {
        let result = self.check_writable().map(|()| {
            let mut inner = self.lock();
            let count = inner.participants.values().filter(|p| p.selected).count() as u64;
            inner.counter = Some(count);
            count
        });

        async move { result }
    }

    fn mark_attendance(
        &self,
        id: &ParticipantId,
        check_in: &CheckIn,
    ) -> impl Future<Output = Result<AttendanceOutcome>> + Send {
        let result = self.check_writable().and_then(|()| {
            let mut inner = self.lock();
            let participant = inner
                .participants
                .get_mut(id)
                .ok_or_else(|| DeskError::participant_not_found(id))?;

            if participant.attend {
                return Ok(AttendanceOutcome::AlreadyAttended(participant.clone()));
            }

            participant.record_check_in(check_in);
            Ok(AttendanceOutcome::Marked(participant.clone()))
        });

        async move { result }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_first_select_creates_counter_at_one() {
        let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
        assert_eq!(repo.counter(), None);

        let change = repo
            .set_selection(&ParticipantId::new("p-001"), true)
            .await
            .unwrap();

        assert!(change.changed);
        assert_eq!(change.count, 1);
        assert_eq!(repo.counter(), Some(1));
    }

    #[tokio::test]
    async fn test_first_reject_creates_counter_at_zero() {
        let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
        let mut selected = fixtures::participant("p-100", "Selected Already");
        selected.selected = true;
        repo.insert(selected);

        let change = repo
            .set_selection(&ParticipantId::new("p-100"), false)
            .await
            .unwrap();

        assert_eq!(change.count, 0);
        assert_eq!(repo.counter(), Some(0));
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
        repo.fail_writes(true);

        let err = repo
            .set_selection(&ParticipantId::new("p-001"), true)
            .await
            .unwrap_err();

        assert!(matches!(err, DeskError::Database(_)));
        assert!(!repo.get("p-001").unwrap().selected);
        assert_eq!(repo.counter(), None);
    }
}
