//! # EventDesk Auth
//!
//! Server-side organizer authentication.
//!
//! Every dashboard request carries `Authorization: Bearer <token>`. The
//! server never trusts client-decoded claims: it hashes the presented token
//! and compares it, in constant time, against the SHA-256 digests configured
//! for each organizer. A match yields an [`Organizer`], the request-scoped
//! identity handlers use (for example as `markedBy` on a check-in).
//!
//! # Example
//!
//! ```
//! use eventdesk_auth::{token_digest, OrganizerDirectory};
//!
//! let config = format!("Grace Hopper:{}", token_digest("door-token"));
//! let directory = OrganizerDirectory::parse(&config)?;
//!
//! let organizer = directory.authenticate("door-token")?;
//! assert_eq!(organizer.name, "Grace Hopper");
//! # Ok::<(), eventdesk_auth::AuthError>(())
//! ```

pub mod error;
pub mod organizer;

pub use error::{AuthError, Result};
pub use organizer::{token_digest, Organizer, OrganizerDirectory};
