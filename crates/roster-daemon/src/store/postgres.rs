//! PostgreSQL adapter for the persistence gateway.
//!
//! One process-wide [`sqlx::PgPool`] backs both port traits. The pool opens
//! connections lazily and replaces dead ones at the point of use, which
//! covers the reconnect requirement without bespoke retry plumbing. All
//! statements bind parameters; user input is never interpolated into SQL.

use std::time::Duration;

use async_trait::async_trait;
use roster_core::person::{Coordinates, Location, NewPerson, Person};
use roster_core::user::UserRecord;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use super::{PersonStore, StoreError, UserStore};
use crate::config::DbConfig;

/// Upper bound on pooled connections.
const MAX_CONNECTIONS: u32 = 8;

/// How long an acquire may wait before the store reports unavailability.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Schema bootstrap. `CREATE TABLE IF NOT EXISTS` keeps restarts idempotent;
/// there is no migration tooling beyond this.
const SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS persons (
        id BIGSERIAL PRIMARY KEY,
        owner_id BIGINT NOT NULL REFERENCES users(id),
        name TEXT NOT NULL,
        cord_x INT NOT NULL,
        cord_y INT NOT NULL,
        creation_date TIMESTAMP DEFAULT now(),
        height INT NOT NULL,
        weight INT NOT NULL,
        color TEXT NOT NULL,
        country TEXT NOT NULL,
        location_x REAL NOT NULL,
        location_y REAL NULL,
        location_name TEXT NULL
    )",
];

/// The production store over a connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects the pool and verifies the database is reachable.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] when no connection can be established;
    /// callers at startup treat that as fatal (exit code 1).
    pub async fn connect(config: &DbConfig) -> Result<Self, StoreError> {
        info!(database = %config.redacted(), "connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&config.url())
            .await
            .map_err(classify)?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool, mainly for tests against a scratch database.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `users` and `persons` tables when absent.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] when the DDL cannot be executed.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await.map_err(classify)?;
        }
        debug!("schema ensured");
        Ok(())
    }

    /// Closes the pool. Called at the end of shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PersonStore for PgStore {
    async fn find_all_persons(&self) -> Result<Vec<Person>, StoreError> {
        let rows = sqlx::query(
            r"SELECT id, owner_id, name, cord_x, cord_y, creation_date,
                     height, weight, color, country,
                     location_x, location_y, location_name
              FROM persons
              ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.iter().map(person_from_row).collect()
    }

    async fn save_person(&self, person: NewPerson) -> Result<Person, StoreError> {
        let row = sqlx::query(
            r"INSERT INTO persons
                (owner_id, name, cord_x, cord_y, height, weight,
                 color, country, location_x, location_y, location_name)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
              RETURNING id, creation_date",
        )
        .bind(person.owner_id)
        .bind(&person.name)
        .bind(person.coordinates.x)
        .bind(person.coordinates.y)
        .bind(person.height)
        .bind(person.weight)
        .bind(person.hair_color.as_str())
        .bind(person.nationality.as_str())
        .bind(person.location.x)
        .bind(person.location.y)
        .bind(person.location.name.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        let id: i64 = row.try_get("id").map_err(classify)?;
        let creation_date: chrono::NaiveDateTime =
            row.try_get("creation_date").map_err(classify)?;

        Person::from_new(person, id, creation_date.and_utc())
            .map_err(|e| StoreError::Constraint(e.to_string()))
    }

    async fn remove_person_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, username, password FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.map(|row| {
            Ok(UserRecord::new(
                row.try_get::<i64, _>("id").map_err(classify)?,
                row.try_get::<String, _>("username").map_err(classify)?,
                row.try_get::<String, _>("password").map_err(classify)?,
            ))
        })
        .transpose()
    }

    async fn exists_user_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(classify)?;
        Ok(exists)
    }

    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match classify(e) {
            StoreError::Constraint(_) => StoreError::DuplicateUser(username.to_string()),
            other => other,
        })?;

        Ok(UserRecord::new(id, username, password_hash))
    }
}

/// Maps a driver error onto the gateway error kinds.
///
/// SQLSTATE class 23 (integrity violations) becomes [`StoreError::Constraint`];
/// everything else is [`StoreError::Unavailable`].
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if let Some(code) = db.code() {
            if code.starts_with("23") {
                return StoreError::Constraint(db.message().to_string());
            }
        }
    }
    StoreError::Unavailable(err.to_string())
}

fn person_from_row(row: &PgRow) -> Result<Person, StoreError> {
    let coordinates = Coordinates::new(
        row.try_get("cord_x").map_err(classify)?,
        row.try_get("cord_y").map_err(classify)?,
    )
    .map_err(|e| StoreError::Constraint(e.to_string()))?;

    let location = Location::new(
        row.try_get("location_x").map_err(classify)?,
        row.try_get("location_y").map_err(classify)?,
        row.try_get("location_name").map_err(classify)?,
    );

    let color: String = row.try_get("color").map_err(classify)?;
    let country: String = row.try_get("country").map_err(classify)?;

    let new = NewPerson::new(
        row.try_get("owner_id").map_err(classify)?,
        row.try_get::<String, _>("name").map_err(classify)?,
        coordinates,
        row.try_get("height").map_err(classify)?,
        row.try_get("weight").map_err(classify)?,
        color
            .parse()
            .map_err(|e: roster_core::person::ValidationError| {
                StoreError::Constraint(e.to_string())
            })?,
        country
            .parse()
            .map_err(|e: roster_core::person::ValidationError| {
                StoreError::Constraint(e.to_string())
            })?,
        location,
    )
    .map_err(|e| StoreError::Constraint(e.to_string()))?;

    let creation_date: chrono::NaiveDateTime = row.try_get("creation_date").map_err(classify)?;

    Person::from_new(new, row.try_get("id").map_err(classify)?, creation_date.and_utc())
        .map_err(|e| StoreError::Constraint(e.to_string()))
}
