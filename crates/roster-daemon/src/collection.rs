//! The write-through person collection.
//!
//! [`PersonList`] owns the authoritative in-memory sequence. Every mutation
//! hits the store first and is mirrored in memory only after the store
//! reports success, so the memory view never gets ahead of the database.
//! A single coarse `RwLock` serialises mutations and gives `snapshot()` a
//! consistent view; store round-trips dominate, so finer locking would buy
//! nothing.
//!
//! There is deliberately no `clear` on this container; bulk removal goes
//! through [`PersonList::remove_where`] with an explicit predicate.

use std::sync::Arc;

use roster_core::person::{NewPerson, Person};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::store::{PersonStore, StoreError};

/// Ordered, store-mirrored list of persons.
pub struct PersonList {
    store: Arc<dyn PersonStore>,
    inner: RwLock<Vec<Person>>,
}

impl PersonList {
    /// Loads the full set from the store, ordered by id.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; at boot this is fatal.
    pub async fn load(store: Arc<dyn PersonStore>) -> Result<Self, StoreError> {
        let initial = store.find_all_persons().await?;
        debug!(count = initial.len(), "collection loaded");
        Ok(Self {
            store,
            inner: RwLock::new(initial),
        })
    }

    /// A consistent copy of the ordered sequence.
    pub async fn snapshot(&self) -> Vec<Person> {
        self.inner.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// The element at index 0, if any.
    pub async fn head(&self) -> Option<Person> {
        self.inner.read().await.first().cloned()
    }

    /// Looks up a person by id.
    pub async fn find_by_id(&self, id: i64) -> Option<Person> {
        self.inner.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// Sum of the `height` field across the collection.
    pub async fn sum_of_height(&self) -> i64 {
        self.inner
            .read()
            .await
            .iter()
            .map(|p| i64::from(p.height))
            .sum()
    }

    /// Appends a person. The store assigns identity; the in-memory insert
    /// happens only after the insert succeeded.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; memory is untouched in that case.
    pub async fn add(&self, person: NewPerson) -> Result<Person, StoreError> {
        let mut inner = self.inner.write().await;
        let saved = self.store.save_person(person).await?;
        inner.push(saved.clone());
        Ok(saved)
    }

    /// Removes the element at `index`. Returns the removed person, or
    /// `None` when the index is out of range.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; memory is untouched in that case.
    pub async fn remove_at(&self, index: usize) -> Result<Option<Person>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(victim_id) = inner.get(index).map(|p| p.id) else {
            return Ok(None);
        };
        self.store.remove_person_by_id(victim_id).await?;
        Ok(Some(inner.remove(index)))
    }

    /// Removes the person with the given id. Returns whether anything was
    /// removed.
    ///
    /// # Errors
    ///
    /// Propagates the store failure; memory is untouched in that case.
    pub async fn remove_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.iter().any(|p| p.id == id) {
            return Ok(false);
        }
        let removed = self.store.remove_person_by_id(id).await?;
        if removed {
            inner.retain(|p| p.id != id);
        }
        Ok(removed)
    }

    /// Removes every person matching `predicate`.
    ///
    /// Victims are computed from a stable snapshot and deleted from the
    /// store in ascending-id order; the in-memory mirror drops exactly the
    /// ids whose store delete succeeded. On a store failure mid-sweep the
    /// successful removals stay committed and the error is returned.
    ///
    /// Returns the ids that were removed, ascending.
    pub async fn remove_where<F>(&self, predicate: F) -> Result<Vec<i64>, StoreError>
    where
        F: Fn(&Person) -> bool + Send,
    {
        let mut inner = self.inner.write().await;

        let mut victims: Vec<i64> = inner
            .iter()
            .filter(|p| predicate(p))
            .map(|p| p.id)
            .collect();
        victims.sort_unstable();

        let mut removed = Vec::with_capacity(victims.len());
        let mut failure = None;
        for id in victims {
            match self.store.remove_person_by_id(id).await {
                Ok(true) => removed.push(id),
                Ok(false) => debug!(id, "person vanished from store before removal"),
                Err(err) => {
                    warn!(id, error = %err, "bulk removal aborted");
                    failure = Some(err);
                    break;
                }
            }
        }

        inner.retain(|p| !removed.contains(&p.id));

        match failure {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }
}
