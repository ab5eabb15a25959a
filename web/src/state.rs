//! Application state shared by every handler.
//!
//! The concrete providers are chosen once, through [`Services`]: the server
//! binary plugs in PostgreSQL, SMTP and the local asset directory, tests plug
//! in the in-memory doubles.

use axum::extract::FromRef;
use eventdesk_auth::OrganizerDirectory;
use eventdesk_certificates::CertificateService;
use eventdesk_core::attendance::{AttendanceEnvironment, AttendanceReducer, AttendanceState};
use eventdesk_core::environment::Clock;
use eventdesk_core::providers::{AssetStore, Mailer, ParticipantRepository};
use eventdesk_core::selection::{SelectionEnvironment, SelectionReducer, SelectionState};
use eventdesk_core::{attendance::AttendanceAction, selection::SelectionAction};
use eventdesk_mailer::BulkMailer;
use eventdesk_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

/// How long a handler waits for a store outcome by default.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// The provider set a deployment runs with.
pub trait Services: Send + Sync + 'static {
    /// Participant store.
    type Participants: ParticipantRepository + Clone + 'static;
    /// Mail transport.
    type Mailer: Mailer + 'static;
    /// Template, font and certificate storage.
    type Assets: AssetStore + 'static;
}

/// Store running the selection reducer.
pub type SelectionStore<P> =
    Store<SelectionState, SelectionAction, SelectionEnvironment<P>, SelectionReducer<P>>;

/// Store running the attendance reducer.
pub type AttendanceStore<P> =
    Store<AttendanceState, AttendanceAction, AttendanceEnvironment<P>, AttendanceReducer<P>>;

/// Application state shared across all HTTP handlers.
pub struct AppState<D: Services> {
    /// Participant store, for reads that bypass the reducers.
    pub participants: D::Participants,
    /// Selection toggles and the counter.
    pub selection: Arc<SelectionStore<D::Participants>>,
    /// Scan lookups and check-ins.
    pub attendance: Arc<AttendanceStore<D::Participants>>,
    /// Acceptance and rejection mail.
    pub mail: Arc<BulkMailer<D::Mailer>>,
    /// Template uploads and certificate rendering.
    pub certificates: Arc<CertificateService<D::Assets>>,
    /// Organizer tokens.
    pub organizers: Arc<OrganizerDirectory>,
    /// How long a handler waits for a store outcome.
    pub store_timeout: Duration,
}

impl<D: Services> AppState<D> {
    /// Wire the stores around `participants` and bundle the services.
    #[must_use]
    pub fn new(
        participants: D::Participants,
        mail: BulkMailer<D::Mailer>,
        certificates: CertificateService<D::Assets>,
        organizers: OrganizerDirectory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let selection = Store::new(
            SelectionState::default(),
            SelectionReducer::new(),
            SelectionEnvironment::new(participants.clone()),
        );
        let attendance = Store::new(
            AttendanceState::default(),
            AttendanceReducer::new(),
            AttendanceEnvironment::new(participants.clone(), clock),
        );

        Self {
            participants,
            selection: Arc::new(selection),
            attendance: Arc::new(attendance),
            mail: Arc::new(mail),
            certificates: Arc::new(certificates),
            organizers: Arc::new(organizers),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Override how long handlers wait for store outcomes.
    #[must_use]
    pub const fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

impl<D: Services> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            participants: self.participants.clone(),
            selection: Arc::clone(&self.selection),
            attendance: Arc::clone(&self.attendance),
            mail: Arc::clone(&self.mail),
            certificates: Arc::clone(&self.certificates),
            organizers: Arc::clone(&self.organizers),
            store_timeout: self.store_timeout,
        }
    }
}

impl<D: Services> FromRef<AppState<D>> for Arc<OrganizerDirectory> {
    fn from_ref(state: &AppState<D>) -> Self {
        Arc::clone(&state.organizers)
    }
}
