//! # EventDesk Testing
//!
//! Testing utilities for EventDesk crates.
//!
//! This crate provides:
//! - [`FixedClock`] and [`test_clock`] for deterministic time
//! - [`ReducerTest`], a given/when/then harness for reducers
//! - In-memory doubles for every provider trait
//! - Participant fixtures and proptest strategies
//!
//! ## Example
//!
//! ```ignore
//! use eventdesk_testing::{fixtures, InMemoryParticipantRepository};
//!
//! #[tokio::test]
//! async fn selecting_updates_counter() {
//!     let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
//!     let change = repo.set_selection(&ParticipantId::new("p-001"), true).await?;
//!     assert_eq!(change.count, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use eventdesk_core::environment::Clock;

pub mod assets;
pub mod fixtures;
pub mod mailer;
pub mod participants;
pub mod reducer_test;

/// Deterministic clocks.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use eventdesk_testing::mocks::FixedClock;
    /// use eventdesk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a constant.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Property-based testing strategies for domain types.
pub mod properties {
    use eventdesk_core::ParticipantId;
    use proptest::prelude::*;

    /// Identifiers shaped like the ones the registration form issues.
    pub fn participant_id() -> impl Strategy<Value = ParticipantId> {
        "[a-zA-Z0-9]{6,20}".prop_map(ParticipantId::new)
    }

    /// A sequence of selection targets, as an organizer clicking through a list.
    pub fn selection_script(len: usize) -> impl Strategy<Value = Vec<(usize, bool)>> {
        prop::collection::vec((0..len.max(1), any::<bool>()), 0..32)
    }
}

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

pub use assets::InMemoryAssetStore;
pub use mailer::RecordingMailer;
pub use mocks::{test_clock, FixedClock};
pub use participants::InMemoryParticipantRepository;
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }
}
