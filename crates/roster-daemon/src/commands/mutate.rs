//! Commands that mutate the collection.
//!
//! Every mutation is owner-gated: a caller can only remove records they
//! created. Bulk commands (`clear`, `remove_greater`) scope their predicate
//! to the caller's own persons instead of failing.

use async_trait::async_trait;
use roster_core::protocol::{Request, Response};
use tracing::debug;

use super::{Command, CommandError, Session};
use crate::collection::PersonList;

/// `add`: appends the supplied person, owned by the session user.
pub struct Add;

#[async_trait]
impl Command for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn help(&self) -> &'static str {
        "adds element to the collection"
    }

    fn required_persons(&self) -> usize {
        1
    }

    async fn execute(
        &self,
        request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        // Arity is checked by the router; persons[0] is present here.
        let new = match request.persons[0].to_new_person(session.user.id) {
            Ok(new) => new,
            Err(err) => return Ok(Response::with_message(format!("invalid data: {err}"))),
        };

        let saved = list.add(new).await?;
        debug!(id = saved.id, owner = saved.owner_id, "person added");
        Ok(Response::with_message("Person added."))
    }
}

/// `remove_by_id <id>`: removes one record the caller owns.
pub struct RemoveById;

#[async_trait]
impl Command for RemoveById {
    fn name(&self) -> &'static str {
        "remove_by_id"
    }

    fn arg_names(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn help(&self) -> &'static str {
        "removes element by id"
    }

    async fn execute(
        &self,
        request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        let Some(raw) = request.args.first() else {
            return Ok(Response::with_message("No id to remove."));
        };
        let Ok(target_id) = raw.parse::<i64>() else {
            return Ok(Response::with_message("Invalid id"));
        };

        let Some(person) = list.find_by_id(target_id).await else {
            return Ok(Response::with_message(format!(
                "Person with id {target_id} not found."
            )));
        };
        if person.owner_id != session.user.id {
            return Err(CommandError::NotOwner);
        }

        if list.remove_by_id(target_id).await? {
            Ok(Response::with_message("Person removed."))
        } else {
            Ok(Response::with_message(format!(
                "Person with id {target_id} not found."
            )))
        }
    }
}

/// `remove_first`: removes the element at index 0.
pub struct RemoveFirst;

#[async_trait]
impl Command for RemoveFirst {
    fn name(&self) -> &'static str {
        "remove_first"
    }

    fn help(&self) -> &'static str {
        "remove first element from collection"
    }

    async fn execute(
        &self,
        _request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        let Some(head) = list.head().await else {
            return Ok(Response::with_message("Collection is empty."));
        };
        if head.owner_id != session.user.id {
            return Err(CommandError::NotOwner);
        }

        list.remove_at(0).await?;
        Ok(Response::with_message("First element removed."))
    }
}

/// `remove_greater`: removes every caller-owned person whose BMI is
/// strictly greater than the supplied reference.
pub struct RemoveGreater;

#[async_trait]
impl Command for RemoveGreater {
    fn name(&self) -> &'static str {
        "remove_greater"
    }

    fn help(&self) -> &'static str {
        "remove all elements greater than given"
    }

    fn required_persons(&self) -> usize {
        1
    }

    async fn execute(
        &self,
        request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        let reference = match request.persons[0].to_new_person(session.user.id) {
            Ok(reference) => reference,
            Err(err) => return Ok(Response::with_message(format!("invalid data: {err}"))),
        };

        // Both the emptiness check and the removal are scoped to the
        // caller; other users' records never affect the outcome.
        let owner = session.user.id;
        if list.snapshot().await.iter().all(|p| p.owner_id != owner) {
            return Ok(Response::with_message("Collection is empty."));
        }

        let threshold = reference.bmi();
        let removed = list
            .remove_where(|p| p.owner_id == owner && p.bmi() > threshold)
            .await?;
        debug!(count = removed.len(), "remove_greater finished");
        if removed.is_empty() {
            return Ok(Response::with_message("Nothing to remove."));
        }
        Ok(Response::with_message(
            "Persons that are greater than given successfully removed.",
        ))
    }
}

/// `clear`: removes every person the caller owns.
pub struct Clear;

#[async_trait]
impl Command for Clear {
    fn name(&self) -> &'static str {
        "clear"
    }

    fn help(&self) -> &'static str {
        "clear all your elements from the collection"
    }

    async fn execute(
        &self,
        _request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        // The removal is caller-scoped, so the emptiness message must be
        // too: a caller who owns nothing gets the empty response even
        // while other users' records are present.
        let owner = session.user.id;
        let removed = list.remove_where(|p| p.owner_id == owner).await?;
        if removed.is_empty() {
            return Ok(Response::with_message("Sorry! Collection is empty."));
        }
        Ok(Response::with_message("Collection cleared."))
    }
}
