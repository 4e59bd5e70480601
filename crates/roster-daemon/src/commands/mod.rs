//! The command registry.
//!
//! Each client-visible command is a [`Command`] implementation with a
//! unique lowercase name, argument names for the help listing, the number
//! of structured person payloads it needs, and an execute contract. The
//! router owns a [`CommandRegistry`] and resolves names case-insensitively.
//!
//! Commands return [`CommandError`] only for failures the router maps onto
//! uniform responses (store trouble, ownership violations); everything a
//! user can fix is reported as a normal response message.

mod misc;
mod mutate;
mod query;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use roster_core::protocol::{Request, Response};
use roster_core::user::UserRecord;

use crate::collection::PersonList;
use crate::store::StoreError;

pub use misc::{ExecuteScript, Exit, Save};
pub use mutate::{Add, Clear, RemoveById, RemoveFirst, RemoveGreater};
pub use query::{Head, PrintFieldDescendingHairColor, Show, SumOfHeight};

/// The authenticated session a command executes under.
#[derive(Debug, Clone)]
pub struct Session {
    /// The verified caller.
    pub user: UserRecord,
}

/// Failure the router converts into a uniform response.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The caller does not own the targeted record.
    #[error("not owner")]
    NotOwner,

    /// The persistence gateway failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A named command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Unique lowercase name.
    fn name(&self) -> &'static str;

    /// Argument names, for the help listing only.
    fn arg_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line help text.
    fn help(&self) -> &'static str;

    /// How many person payloads the request must carry.
    fn required_persons(&self) -> usize {
        0
    }

    /// Executes against the collection under the given session.
    async fn execute(
        &self,
        request: &Request,
        session: &Session,
        list: &PersonList,
    ) -> Result<Response, CommandError>;
}

/// Name-indexed set of commands, preserving registration order for help.
pub struct CommandRegistry {
    ordered: Vec<Arc<dyn Command>>,
    by_name: HashMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ordered: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// The full production command set, in help order.
    #[must_use]
    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Add));
        registry.register(Arc::new(RemoveById));
        registry.register(Arc::new(RemoveFirst));
        registry.register(Arc::new(RemoveGreater));
        registry.register(Arc::new(Clear));
        registry.register(Arc::new(Show));
        registry.register(Arc::new(Head));
        registry.register(Arc::new(SumOfHeight));
        registry.register(Arc::new(PrintFieldDescendingHairColor));
        registry.register(Arc::new(Save));
        registry.register(Arc::new(ExecuteScript));
        registry.register(Arc::new(Exit));
        registry
    }

    /// Adds a command. Last registration wins on a name clash.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.by_name.insert(command.name(), command.clone());
        self.ordered.push(command);
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Command>> {
        let lowered = name.to_ascii_lowercase();
        self.by_name.get(lowered.as_str())
    }

    /// Number of person payloads `name` requires; 0 for unknown commands.
    #[must_use]
    pub fn required_persons_for(&self, name: &str) -> usize {
        self.find(name).map_or(0, |c| c.required_persons())
    }

    /// The help listing, one line per command.
    #[must_use]
    pub fn help_text(&self) -> String {
        let mut out = String::from("Available commands:");
        for command in &self.ordered {
            out.push_str(&format!(
                "\n ~ {} [{}] - {}",
                command.name(),
                command.arg_names().join(", "),
                command.help()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_the_command_set() {
        let registry = CommandRegistry::with_default_commands();
        for name in [
            "add",
            "remove_by_id",
            "remove_first",
            "remove_greater",
            "clear",
            "show",
            "head",
            "sum_of_height",
            "print_field_descending_hair_color",
            "save",
            "execute_script",
            "exit",
        ] {
            assert!(registry.find(name).is_some(), "missing command {name}");
        }
        assert!(registry.find("floop").is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = CommandRegistry::with_default_commands();
        assert!(registry.find("ADD").is_some());
        assert!(registry.find("Show").is_some());
    }

    #[test]
    fn payload_arity_is_declared() {
        let registry = CommandRegistry::with_default_commands();
        assert_eq!(registry.required_persons_for("add"), 1);
        assert_eq!(registry.required_persons_for("remove_greater"), 1);
        assert_eq!(registry.required_persons_for("show"), 0);
        assert_eq!(registry.required_persons_for("nope"), 0);
    }

    #[test]
    fn help_lists_every_command_with_args() {
        let registry = CommandRegistry::with_default_commands();
        let help = registry.help_text();
        assert!(help.starts_with("Available commands:"));
        assert!(help.contains(" ~ add [] - "));
        assert!(help.contains(" ~ remove_by_id [id] - "));
        assert!(help.contains(" ~ execute_script [filepath] - "));
    }
}
