//! HTTP surface of the EventDesk dashboard.
//!
//! Handlers are thin: they parse the request, turn it into a store action
//! (or a service call), wait for the outcome and map it to a response.
//!
//! ```text
//! HTTP request
//!   → correlation id + span            (middleware)
//!   → organizer token check            (middleware, /api only)
//!   → handler builds an Action         (handlers)
//!   → Store runs reducer + effects     (eventdesk-runtime)
//!   → outcome action → JSON response   (handlers, AppError)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use eventdesk_web::{router, AppState};
//!
//! let state = AppState::<Production>::new(repo, mailer, certificates, organizers, clock);
//! let app = router(state);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{AuthenticatedOrganizer, CorrelationId};
pub use middleware::{correlation_id_layer, CorrelationIdExt, CORRELATION_ID_HEADER};
pub use router::{cors_layer, router};
pub use state::{AppState, Services};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
