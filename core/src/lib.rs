//! # EventDesk Core
//!
//! Domain types, reducers and provider traits for the EventDesk
//! event-operations service.
//!
//! The crate follows the reducer architecture used across the workspace:
//!
//! - **State**: what a feature remembers between actions
//! - **Action**: every input to a reducer (commands and the results of effects)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of I/O, executed by the runtime `Store`
//! - **Environment**: injected providers (repository, clock, mailer, assets)
//!
//! ## Features
//!
//! - [`selection`]: the selection toggle and the selected-participant counter
//! - [`attendance`]: QR-scan lookup and the `NOT_ATTENDED → ATTENDED` transition
//! - [`mail`]: bulk mail requests, envelopes and batch reports
//!
//! ## Example
//!
//! ```ignore
//! use eventdesk_core::selection::{SelectionAction, SelectionEnvironment, SelectionReducer};
//!
//! let store = Store::new(
//!     SelectionState::default(),
//!     SelectionReducer::new(),
//!     SelectionEnvironment::new(repository),
//! );
//!
//! store.send(SelectionAction::SetSelection {
//!     correlation_id: Uuid::new_v4(),
//!     participant_id: ParticipantId::new("p-1"),
//!     selected: true,
//! }).await?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub mod attendance;
pub mod error;
pub mod mail;
pub mod participant;
pub mod providers;
pub mod selection;

pub use error::{DeskError, Result};
pub use participant::{
    AttendanceOutcome, CheckIn, Participant, ParticipantFilter, ParticipantId, SelectionChange,
};

/// Reducer module - the core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O themselves; anything touching the database, the
/// mail relay or the clock is described as an [`Effect`](crate::effect::Effect)
/// or read from the environment.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects the runtime
        /// should execute. Most actions produce zero or one effect, so the
        /// result is inline-allocated for up to four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned by reducers. The runtime executes them and
/// feeds any resulting action back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap a future producing an optional follow-up action
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }
    }
}

/// Environment module - dependency injection traits
///
/// External dependencies that are not providers of domain data (currently
/// only time) are abstracted here. Domain providers live in [`providers`].
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
