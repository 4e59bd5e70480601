//! Read-only commands over the collection snapshot.

use async_trait::async_trait;
use roster_core::person::HairColor;
use roster_core::protocol::{Request, Response};

use super::{Command, CommandError, Session};
use crate::collection::PersonList;

/// `show`: the full snapshot.
pub struct Show;

#[async_trait]
impl Command for Show {
    fn name(&self) -> &'static str {
        "show"
    }

    fn help(&self) -> &'static str {
        "shows elements of the collection"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        let snapshot = list.snapshot().await;
        if snapshot.is_empty() {
            return Ok(Response::with_message("Collection is empty."));
        }
        Ok(Response::with_persons(
            "Elements of the collection:",
            &snapshot,
        ))
    }
}

/// `head`: the element at index 0.
pub struct Head;

#[async_trait]
impl Command for Head {
    fn name(&self) -> &'static str {
        "head"
    }

    fn help(&self) -> &'static str {
        "show first element of collection"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        match list.head().await {
            None => Ok(Response::with_message("Collection is empty.")),
            Some(first) => Ok(Response::with_persons(
                "First element of collection",
                std::slice::from_ref(&first),
            )),
        }
    }
}

/// `sum_of_height`: sums the `height` field.
pub struct SumOfHeight;

#[async_trait]
impl Command for SumOfHeight {
    fn name(&self) -> &'static str {
        "sum_of_height"
    }

    fn help(&self) -> &'static str {
        "sum of height of all elements"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        if list.is_empty().await {
            return Ok(Response::with_message("Collection is empty."));
        }
        let sum = list.sum_of_height().await;
        Ok(Response::with_message(format!("Sum of height: {sum}")))
    }
}

/// `print_field_descending_hair_color`: hair colors sorted descending by
/// declaration order.
pub struct PrintFieldDescendingHairColor;

#[async_trait]
impl Command for PrintFieldDescendingHairColor {
    fn name(&self) -> &'static str {
        "print_field_descending_hair_color"
    }

    fn help(&self) -> &'static str {
        "print field hair color in descending order"
    }

    async fn execute(
        &self,
        _request: &Request,
        _session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError> {
        let snapshot = list.snapshot().await;
        if snapshot.is_empty() {
            return Ok(Response::with_message("Collection is empty."));
        }

        let mut colors: Vec<HairColor> = snapshot.iter().map(|p| p.hair_color).collect();
        colors.sort_by(|a, b| b.cmp(a));
        let rendered = colors
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Response::with_message(format!(
            "Field hair color in descending order: {rendered}"
        )))
    }
}
