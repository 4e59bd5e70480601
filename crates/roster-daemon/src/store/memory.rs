//! In-memory stub store.
//!
//! Implements both gateway ports with the same observable semantics as the
//! PostgreSQL adapter: monotonic id assignment, ids never reused after
//! deletion, unique usernames. Used by unit tests and by the end-to-end
//! suite, where a real daemon runs against this store instead of a live
//! database.
//!
//! Failure injection: ids registered via [`MemoryStore::fail_removal_of`]
//! make `remove_person_by_id` report unavailability, which is how the
//! partial-commit behaviour of `remove_where` is exercised.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use roster_core::person::{NewPerson, Person};
use roster_core::user::UserRecord;

use super::{PersonStore, StoreError, UserStore};

/// Shared in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    persons: Mutex<Vec<Person>>,
    users: Mutex<Vec<UserRecord>>,
    next_person_id: AtomicI64,
    next_user_id: AtomicI64,
    failing_removals: Mutex<HashSet<i64>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            persons: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            next_person_id: AtomicI64::new(1),
            next_user_id: AtomicI64::new(1),
            failing_removals: Mutex::new(HashSet::new()),
        }
    }

    /// Makes future removals of `id` fail with
    /// [`StoreError::Unavailable`].
    pub fn fail_removal_of(&self, id: i64) {
        self.failing_removals.lock().expect("lock poisoned").insert(id);
    }

    /// Current number of person rows.
    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    async fn find_all_persons(&self) -> Result<Vec<Person>, StoreError> {
        let mut all = self.persons.lock().expect("lock poisoned").clone();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn save_person(&self, person: NewPerson) -> Result<Person, StoreError> {
        let id = self.next_person_id.fetch_add(1, Ordering::SeqCst);
        let person = Person::from_new(person, id, Utc::now())
            .map_err(|e| StoreError::Constraint(e.to_string()))?;
        self.persons
            .lock()
            .expect("lock poisoned")
            .push(person.clone());
        Ok(person)
    }

    async fn remove_person_by_id(&self, id: i64) -> Result<bool, StoreError> {
        if self
            .failing_removals
            .lock()
            .expect("lock poisoned")
            .contains(&id)
        {
            return Err(StoreError::Unavailable(format!(
                "injected failure removing person {id}"
            )));
        }
        let mut persons = self.persons.lock().expect("lock poisoned");
        let before = persons.len();
        persons.retain(|p| p.id != id);
        Ok(persons.len() < before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .lock()
            .expect("lock poisoned")
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn exists_user_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .lock()
            .expect("lock poisoned")
            .iter()
            .any(|u| u.username == username))
    }

    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().expect("lock poisoned");
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let record = UserRecord::new(id, username, password_hash);
        users.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::person::{Coordinates, Country, HairColor, Location};

    fn draft(owner: i64) -> NewPerson {
        NewPerson::new(
            owner,
            "A",
            Coordinates::new(0, 0).unwrap(),
            170,
            70,
            HairColor::Blue,
            Country::Usa,
            Location::new(1.0, None, None),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ids_are_monotonic_and_never_reused() {
        let store = MemoryStore::new();
        let a = store.save_person(draft(1)).await.unwrap();
        let b = store.save_person(draft(1)).await.unwrap();
        assert!(b.id > a.id);

        assert!(store.remove_person_by_id(b.id).await.unwrap());
        let c = store.save_person(draft(1)).await.unwrap();
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::new();
        store.save_user("alice", "h").await.unwrap();
        let err = store.save_user("alice", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUser(name) if name == "alice"));
    }

    #[tokio::test]
    async fn injected_removal_failure_surfaces_as_unavailable() {
        let store = MemoryStore::new();
        let p = store.save_person(draft(1)).await.unwrap();
        store.fail_removal_of(p.id);
        assert!(matches!(
            store.remove_person_by_id(p.id).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
