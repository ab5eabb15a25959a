//! Selection reducer tests against the in-memory participant store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use eventdesk_core::selection::{
    SelectionAction, SelectionEnvironment, SelectionReducer, SelectionState,
};
use eventdesk_core::{DeskError, ParticipantId};
use eventdesk_testing::reducer_test::{assertions, execute_effects};
use eventdesk_testing::{fixtures, properties, InMemoryParticipantRepository, ReducerTest};
use proptest::prelude::*;
use uuid::Uuid;

type Reducer = SelectionReducer<InMemoryParticipantRepository>;

fn env(repo: &InMemoryParticipantRepository) -> SelectionEnvironment<InMemoryParticipantRepository> {
    SelectionEnvironment::new(repo.clone())
}

async fn set(
    repo: &InMemoryParticipantRepository,
    id: &str,
    selected: bool,
) -> SelectionAction {
    let effects = ReducerTest::new(Reducer::new())
        .with_env(env(repo))
        .given_state(SelectionState::default())
        .when_action(SelectionAction::SetSelection {
            correlation_id: Uuid::new_v4(),
            participant_id: ParticipantId::new(id),
            selected,
        })
        .then_state(|state| assert_eq!(state.count, None))
        .then_effects(assertions::assert_has_future_effect)
        .run();

    let mut actions = execute_effects(effects).await;
    assert_eq!(actions.len(), 1);
    actions.remove(0)
}

#[tokio::test]
async fn select_then_reject_moves_counter_by_one_each_way() {
    let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());

    let selected = set(&repo, "p-001", true).await;
    assert!(matches!(
        selected,
        SelectionAction::SelectionApplied { changed: true, count: 1, .. }
    ));

    let second = set(&repo, "p-002", true).await;
    assert_eq!(second.reported_count(), Some(2));

    let rejected = set(&repo, "p-001", false).await;
    assert_eq!(rejected.reported_count(), Some(1));
    assert_eq!(repo.counter(), Some(1));
    assert_eq!(repo.selected_count(), 1);
}

#[tokio::test]
async fn setting_current_value_leaves_counter_alone() {
    let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
    set(&repo, "p-003", true).await;

    let again = set(&repo, "p-003", true).await;
    match again {
        SelectionAction::SelectionApplied { changed, count, participant, .. } => {
            assert!(!changed);
            assert_eq!(count, 1);
            assert!(participant.selected);
        },
        other => panic!("unexpected action: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_participant_is_rejected() {
    let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());

    let outcome = set(&repo, "nobody", true).await;
    assert!(matches!(outcome, SelectionAction::SelectionRejected { .. }));
    assert_eq!(repo.counter(), None);
}

#[tokio::test]
async fn store_failure_is_reported() {
    let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
    repo.fail_writes(true);

    let outcome = set(&repo, "p-001", true).await;
    assert!(matches!(
        outcome,
        SelectionAction::SelectionFailed { error: DeskError::Database(_), .. }
    ));
}

#[tokio::test]
async fn recount_repairs_drifted_counter() {
    let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
    set(&repo, "p-001", true).await;
    repo.set_counter(Some(7));

    let effects = ReducerTest::new(Reducer::new())
        .with_env(env(&repo))
        .given_state(SelectionState::default())
        .when_action(SelectionAction::Recount {
            correlation_id: Uuid::new_v4(),
        })
        .run();

    let actions = execute_effects(effects).await;
    assert!(matches!(actions[..], [SelectionAction::CountLoaded { count: 1, .. }]));
    assert_eq!(repo.counter(), Some(1));
}

#[test]
fn applied_result_updates_cached_count() {
    let repo = InMemoryParticipantRepository::new();
    let participant = fixtures::participant("p-1", "Lin");

    ReducerTest::new(Reducer::new())
        .with_env(env(&repo))
        .given_state(SelectionState {
            last_error: Some("earlier failure".into()),
            ..SelectionState::default()
        })
        .when_action(SelectionAction::SelectionApplied {
            correlation_id: Uuid::new_v4(),
            participant,
            changed: true,
            count: 4,
        })
        .then_state(|state| {
            assert_eq!(state.count, Some(4));
            assert_eq!(state.toggles_applied, 1);
            assert_eq!(state.last_error, None);
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn failure_is_remembered() {
    let repo = InMemoryParticipantRepository::new();

    ReducerTest::new(Reducer::new())
        .with_env(env(&repo))
        .given_state(SelectionState::default())
        .when_action(SelectionAction::SelectionFailed {
            correlation_id: Uuid::new_v4(),
            error: DeskError::Database("deadlock detected".into()),
        })
        .then_state(|state| {
            assert_eq!(
                state.last_error.as_deref(),
                Some("Database error: deadlock detected")
            );
        })
        .run();
}

proptest! {
    #[test]
    fn counter_always_matches_selected_rows(script in properties::selection_script(3)) {
        let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
        let ids = ["p-001", "p-002", "p-003"];

        tokio_test::block_on(async {
            for (index, selected) in script {
                let before = repo.counter().unwrap_or(0);
                let outcome = set(&repo, ids[index], selected).await;
                let SelectionAction::SelectionApplied { changed, count, .. } = outcome else {
                    panic!("unexpected outcome {outcome:?}");
                };
                let expected = match (changed, selected) {
                    (false, _) => before,
                    (true, true) => before + 1,
                    (true, false) => before - 1,
                };
                assert_eq!(count, expected);
            }
        });

        prop_assert_eq!(repo.counter().unwrap_or(0), repo.selected_count());
    }
}
