//! `PostgreSQL` participant store for EventDesk.
//!
//! Implements [`ParticipantRepository`](eventdesk_core::providers::ParticipantRepository)
//! over a `participants` table and a single-row `selection_counter` table.
//!
//! - Selection changes update the participant and the counter in one
//!   transaction, and only when the value actually changes.
//! - Attendance is a conditional write (`attend = FALSE`), so the first
//!   check-in wins even under concurrent scans.
//! - [`PostgresParticipantRepository::recount_selection`] rebuilds the
//!   counter from the rows in a single statement.
//!
//! # Example
//!
//! ```no_run
//! use eventdesk_postgres::PostgresParticipantRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/eventdesk").await?;
//! let participants = PostgresParticipantRepository::new(pool);
//! participants.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod participants;

pub use participants::PostgresParticipantRepository;
