//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any other | `Database` |
//! | anything else | N/A | `Database` |
//!
//! Every session wraps one transaction; dropping it without `commit` rolls back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use naslet_core::{EventId, UserId};
use naslet_events::{Event, Participation, ParticipationStatus, User};

use super::{Session, SessionProvider, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Every statement is idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tracing::info!("database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for PostgresStore {
    async fn session(&self) -> StoreResult<Box<dyn Session>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(Box::new(PostgresSession { tx }))
    }
}

pub struct PostgresSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl Session for PostgresSession {
    #[instrument(skip(self), err)]
    async fn find_user_by_identity(&mut self, identity: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, phone, name, password_hash
            FROM users
            WHERE email = $1 OR phone = $1
            LIMIT 1
            "#,
        )
        .bind(identity)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_identity", e))?;

        row.map(|r| UserRow::from_row(&r).map(User::from))
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("user row: {e}")))
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, phone, name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.name)
        .bind(&user.password_hash)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(event_id = %id), err)]
    async fn find_event(&mut self, id: EventId) -> StoreResult<Option<Event>> {
        let row = sqlx::query(
            r#"
            SELECT id, creator_id, name, description, date, location, price, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_event", e))?;

        row.map(|r| EventRow::from_row(&r).map(Event::from))
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("event row: {e}")))
    }

    #[instrument(skip(self), fields(creator_id = %creator), err)]
    async fn list_creator_events(
        &mut self,
        creator: UserId,
        only: Option<EventId>,
    ) -> StoreResult<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT id, creator_id, name, description, date, location, price, created_at
            FROM events
            WHERE creator_id = $1 AND ($2::uuid IS NULL OR id = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(creator.as_uuid())
        .bind(only.map(Uuid::from))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_creator_events", e))?;

        rows.iter()
            .map(|r| EventRow::from_row(r).map(Event::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt(format!("event row: {e}")))
    }

    async fn insert_event(&mut self, event: &Event) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, creator_id, name, description, date, location, price, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.creator_id.as_uuid())
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.price)
        .bind(event.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_event", e))?;
        Ok(())
    }

    async fn update_event(&mut self, event: &Event) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = $2, description = $3, date = $4, location = $5, price = $6
            WHERE id = $1
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.price)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_event", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&mut self, id: EventId) -> StoreResult<bool> {
        // Participations go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_event", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(event_id = %event), err)]
    async fn list_participants(&mut self, event: EventId) -> StoreResult<Vec<(User, Participation)>> {
        let rows = sqlx::query(
            r#"
            SELECT
                u.id, u.email, u.phone, u.name, u.password_hash,
                p.user_id, p.event_id, p.status, p.joined_at
            FROM participations p
            JOIN users u ON u.id = p.user_id
            WHERE p.event_id = $1
            ORDER BY p.joined_at ASC, p.user_id ASC
            "#,
        )
        .bind(event.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_participants", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let user = UserRow::from_row(row)
                .map_err(|e| StoreError::Corrupt(format!("user row: {e}")))?;
            let participation = ParticipationRow::from_row(row)
                .map_err(|e| StoreError::Corrupt(format!("participation row: {e}")))?;
            out.push((user.into(), participation.try_into()?));
        }
        Ok(out)
    }

    async fn find_participation(
        &mut self,
        user: UserId,
        event: EventId,
    ) -> StoreResult<Option<Participation>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, event_id, status, joined_at
            FROM participations
            WHERE user_id = $1 AND event_id = $2
            "#,
        )
        .bind(user.as_uuid())
        .bind(event.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_participation", e))?;

        match row {
            Some(r) => {
                let row = ParticipationRow::from_row(&r)
                    .map_err(|e| StoreError::Corrupt(format!("participation row: {e}")))?;
                Ok(Some(row.try_into()?))
            }
            None => Ok(None),
        }
    }

    async fn insert_participation(&mut self, participation: &Participation) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO participations (user_id, event_id, status, joined_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(participation.user_id.as_uuid())
        .bind(participation.event_id.as_uuid())
        .bind(participation.status.as_str())
        .bind(participation.joined_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_participation", e))?;
        Ok(())
    }

    async fn set_participation_status(
        &mut self,
        user: UserId,
        event: EventId,
        status: ParticipationStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE participations SET status = $3 WHERE user_id = $1 AND event_id = $2",
        )
        .bind(user.as_uuid())
        .bind(event.as_uuid())
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_participation_status", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_participation(&mut self, user: UserId, event: EventId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM participations WHERE user_id = $1 AND event_id = $2")
            .bind(user.as_uuid())
            .bind(event.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_participation", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        other => StoreError::Database(format!("{} failed: {}", operation, other)),
    }
}

struct UserRow {
    id: Uuid,
    email: Option<String>,
    phone: Option<String>,
    name: String,
    password_hash: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            phone: row.phone,
            name: row.name,
            password_hash: row.password_hash,
        }
    }
}

struct EventRow {
    id: Uuid,
    creator_id: Uuid,
    name: String,
    description: Option<String>,
    date: NaiveDate,
    location: Option<String>,
    price: Option<i64>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(EventRow {
            id: row.try_get("id")?,
            creator_id: row.try_get("creator_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            date: row.try_get("date")?,
            location: row.try_get("location")?,
            price: row.try_get("price")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: EventId::from_uuid(row.id),
            creator_id: UserId::from_uuid(row.creator_id),
            name: row.name,
            description: row.description,
            date: row.date,
            location: row.location,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

struct ParticipationRow {
    user_id: Uuid,
    event_id: Uuid,
    status: String,
    joined_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ParticipationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ParticipationRow {
            user_id: row.try_get("user_id")?,
            event_id: row.try_get("event_id")?,
            status: row.try_get("status")?,
            joined_at: row.try_get("joined_at")?,
        })
    }
}

impl TryFrom<ParticipationRow> for Participation {
    type Error = StoreError;

    fn try_from(row: ParticipationRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ParticipationStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Participation {
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            status,
            joined_at: row.joined_at,
        })
    }
}
