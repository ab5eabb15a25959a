//! Participant repository backed by `PostgreSQL`.

use eventdesk_core::providers::ParticipantRepository;
use eventdesk_core::{
    AttendanceOutcome, CheckIn, DeskError, Participant, ParticipantFilter, ParticipantId, Result,
    SelectionChange,
};
use sqlx::{PgConnection, PgPool};

const COLUMNS: &str = "id, name, email, degree, department, experience_response, \
                       resilience_response, goals_response, attend, selected, checked_in_at, marked_by";

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    id: String,
    name: String,
    email: String,
    degree: String,
    department: String,
    experience_response: String,
    resilience_response: String,
    goals_response: String,
    attend: bool,
    selected: bool,
    checked_in_at: Option<String>,
    marked_by: Option<String>,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: ParticipantId::new(row.id),
            name: row.name,
            email: row.email,
            degree: row.degree,
            department: row.department,
            experience_response: row.experience_response,
            resilience_response: row.resilience_response,
            goals_response: row.goals_response,
            attend: row.attend,
            selected: row.selected,
            timestamp: row.checked_in_at,
            marked_by: row.marked_by,
        }
    }
}

fn database_error(context: &'static str) -> impl Fn(sqlx::Error) -> DeskError {
    move |e| DeskError::Database(format!("{context}: {e}"))
}

fn to_count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

/// `PostgreSQL` participant repository.
#[derive(Clone, Debug)]
pub struct PostgresParticipantRepository {
    pool: PgPool,
}

impl PostgresParticipantRepository {
    /// Create a repository over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DeskError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Check that the database answers.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`] if it does not.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(database_error("Database ping failed"))?;
        Ok(())
    }

    /// Insert a participant, or overwrite the record with the same id.
    ///
    /// Used to import registrations; the selection counter is not touched,
    /// so run [`recount_selection`](ParticipantRepository::recount_selection)
    /// after importing selected participants.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Database`] on failure.
    pub async fn upsert(&self, participant: &Participant) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO participants (
                id, name, email, degree, department, experience_response,
                resilience_response, goals_response, attend, selected, checked_in_at, marked_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                degree = EXCLUDED.degree,
                department = EXCLUDED.department,
                experience_response = EXCLUDED.experience_response,
                resilience_response = EXCLUDED.resilience_response,
                goals_response = EXCLUDED.goals_response,
                attend = EXCLUDED.attend,
                selected = EXCLUDED.selected,
                checked_in_at = EXCLUDED.checked_in_at,
                marked_by = EXCLUDED.marked_by
            ",
        )
        .bind(participant.id.as_str())
        .bind(&participant.name)
        .bind(&participant.email)
        .bind(&participant.degree)
        .bind(&participant.department)
        .bind(&participant.experience_response)
        .bind(&participant.resilience_response)
        .bind(&participant.goals_response)
        .bind(participant.attend)
        .bind(participant.selected)
        .bind(participant.timestamp.as_deref())
        .bind(participant.marked_by.as_deref())
        .execute(&self.pool)
        .await
        .map_err(database_error("Failed to upsert participant"))?;
        Ok(())
    }

    async fn fetch(conn: &mut PgConnection, id: &ParticipantId) -> Result<Option<Participant>> {
        let row: Option<ParticipantRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM participants WHERE id = $1"))
                .bind(id.as_str())
                .fetch_optional(conn)
                .await
                .map_err(database_error("Failed to load participant"))?;
        Ok(row.map(Participant::from))
    }

    async fn counter(conn: &mut PgConnection) -> Result<u64> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT count FROM selection_counter WHERE id = 1")
                .fetch_optional(conn)
                .await
                .map_err(database_error("Failed to read selection counter"))?;
        Ok(count.map_or(0, to_count))
    }
}

impl ParticipantRepository for PostgresParticipantRepository {
    #[tracing::instrument(skip(self))]
    async fn list(&self, filter: ParticipantFilter) -> Result<Vec<Participant>> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM participants \
             WHERE ($1::BOOLEAN IS NULL OR selected = $1) \
               AND ($2::BOOLEAN IS NULL OR attend = $2) \
             ORDER BY name, id"
        ))
        .bind(filter.selected)
        .bind(filter.attended)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("Failed to list participants"))?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }

    async fn find(&self, id: &ParticipantId) -> Result<Option<Participant>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(database_error("Failed to acquire connection"))?;
        Self::fetch(&mut conn, id).await
    }

    #[tracing::instrument(skip(self), fields(participant_id = %id))]
    async fn set_selection(&self, id: &ParticipantId, selected: bool) -> Result<SelectionChange> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(database_error("Failed to begin transaction"))?;

        // The row lock taken here serialises concurrent toggles of one participant.
        let updated: Option<ParticipantRow> = sqlx::query_as(&format!(
            "UPDATE participants SET selected = $2 \
             WHERE id = $1 AND selected <> $2 \
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(selected)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database_error("Failed to update selection"))?;

        let Some(row) = updated else {
            let participant = Self::fetch(&mut tx, id)
                .await?
                .ok_or_else(|| DeskError::participant_not_found(id))?;
            let count = Self::counter(&mut tx).await?;
            tx.rollback()
                .await
                .map_err(database_error("Failed to end transaction"))?;

            return Ok(SelectionChange {
                participant,
                changed: false,
                count,
            });
        };

        let (initial, delta): (i64, i64) = if selected { (1, 1) } else { (0, -1) };
        let count: i64 = sqlx::query_scalar(
            r"
            INSERT INTO selection_counter (id, count) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET
                count = GREATEST(selection_counter.count + $2, 0),
                updated_at = now()
            RETURNING count
            ",
        )
        .bind(initial)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Selection counter update failed, rolling back");
            DeskError::Database(format!("Failed to update selection counter: {e}"))
        })?;

        tx.commit()
            .await
            .map_err(database_error("Failed to commit selection change"))?;

        metrics::counter!("store.participants.writes", "operation" => "set_selection").increment(1);
        Ok(SelectionChange {
            participant: row.into(),
            changed: true,
            count: to_count(count),
        })
    }

    async fn selection_count(&self) -> Result<u64> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(database_error("Failed to acquire connection"))?;
        Self::counter(&mut conn).await
    }

    #[tracing::instrument(skip(self))]
    async fn recount_selection(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r"
            INSERT INTO selection_counter (id, count)
            SELECT 1, COUNT(*) FROM participants WHERE selected
            ON CONFLICT (id) DO UPDATE SET
                count = EXCLUDED.count,
                updated_at = now()
            RETURNING count
            ",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("Failed to recount selection"))?;

        tracing::info!(count, "Selection counter rebuilt from participant rows");
        Ok(to_count(count))
    }

    #[tracing::instrument(skip(self, check_in), fields(participant_id = %id))]
    async fn mark_attendance(&self, id: &ParticipantId, check_in: &CheckIn) -> Result<AttendanceOutcome> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(database_error("Failed to acquire connection"))?;

        let marked: Option<ParticipantRow> = sqlx::query_as(&format!(
            "UPDATE participants SET attend = TRUE, checked_in_at = $2, marked_by = $3 \
             WHERE id = $1 AND attend = FALSE \
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(&check_in.scanned_at)
        .bind(&check_in.marked_by)
        .fetch_optional(&mut *conn)
        .await
        .map_err(database_error("Failed to mark attendance"))?;

        if let Some(row) = marked {
            metrics::counter!("store.participants.writes", "operation" => "mark_attendance").increment(1);
            return Ok(AttendanceOutcome::Marked(row.into()));
        }

        Self::fetch(&mut conn, id)
            .await?
            .map(AttendanceOutcome::AlreadyAttended)
            .ok_or_else(|| DeskError::participant_not_found(id))
    }
}
