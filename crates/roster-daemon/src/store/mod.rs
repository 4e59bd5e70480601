//! Persistence gateway.
//!
//! The gateway is a pair of port traits so every consumer (collection,
//! auth, router) depends on the interface, not on PostgreSQL:
//!
//! - [`PersonStore`]: the `persons` table,
//! - [`UserStore`]: the `users` table.
//!
//! Adapters:
//!
//! - [`PgStore`]: the production adapter over a `sqlx` connection pool with
//!   runtime-bound parameterised statements only,
//! - [`MemoryStore`]: an in-memory stub for unit and integration tests.
//!
//! Every mutation of the person collection goes through the write-through
//! list, which calls these traits; nothing else writes to the tables.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use roster_core::person::{NewPerson, Person};
use roster_core::user::UserRecord;

/// Persistence failure, already classified for the router.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The driver could not reach or talk to the database.
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// The database rejected a write on schema grounds.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The username is already taken.
    #[error("username `{0}` already exists")]
    DuplicateUser(String),
}

/// Gateway to the `persons` table.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// All persons, ordered by id ascending (insertion order).
    async fn find_all_persons(&self) -> Result<Vec<Person>, StoreError>;

    /// Inserts a person; the store assigns `id` and `creation_date`.
    async fn save_person(&self, person: NewPerson) -> Result<Person, StoreError>;

    /// Deletes by id. Returns whether a row was removed.
    async fn remove_person_by_id(&self, id: i64) -> Result<bool, StoreError>;
}

/// Gateway to the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, StoreError>;

    async fn exists_user_by_username(&self, username: &str) -> Result<bool, StoreError>;

    /// Inserts a user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateUser`] when the username is taken.
    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError>;
}
