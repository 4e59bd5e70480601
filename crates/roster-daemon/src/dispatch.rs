//! Request router.
//!
//! One entry point, [`Router::route`], turns a decoded request into a
//! response. The sequence is fixed:
//!
//! 1. a blank command answers with an empty response;
//! 2. `register` is handled before authentication (it is the only way a
//!    session user can come to exist);
//! 3. credentials are resolved and verified; any failure answers with the
//!    uniform `"Authorization failed."` and touches nothing else;
//! 4. `help` is composed from the registry;
//! 5. the command is looked up case-insensitively;
//! 6. the person-payload arity is checked;
//! 7. the command executes; every command-level failure becomes a normal
//!    response. Nothing in here ever closes the connection.

use std::sync::Arc;

use roster_core::protocol::{Request, Response};
use tracing::{debug, warn};

use crate::auth::AuthService;
use crate::collection::PersonList;
use crate::commands::{CommandError, CommandRegistry, Session};
use crate::store::StoreError;

/// Uniform authentication failure text. Never reveals which side was wrong.
pub const AUTH_FAILED: &str = "Authorization failed.";

/// Routes requests to commands.
pub struct Router {
    registry: CommandRegistry,
    auth: AuthService,
    list: Arc<PersonList>,
}

impl Router {
    #[must_use]
    pub fn new(registry: CommandRegistry, auth: AuthService, list: Arc<PersonList>) -> Self {
        Self {
            registry,
            auth,
            list,
        }
    }

    /// Resolves a request to exactly one response.
    pub async fn route(&self, request: &Request) -> Response {
        let command = request.command.trim();
        if command.is_empty() {
            return Response::empty();
        }

        if command.eq_ignore_ascii_case("register") {
            return self.handle_register(request).await;
        }

        let Some(credentials) = &request.credentials else {
            return Response::with_message(AUTH_FAILED);
        };
        let user = match self.auth.authenticate(credentials).await {
            Ok(Some(user)) => user,
            Ok(None) => return Response::with_message(AUTH_FAILED),
            Err(err) => return store_error_response(&err),
        };

        if command.eq_ignore_ascii_case("help") {
            return Response::with_message(self.registry.help_text());
        }

        let Some(handler) = self.registry.find(command) else {
            return Response::with_message(format!(
                "command '{command}' not found, type 'help' for help"
            ));
        };

        if request.persons.len() < handler.required_persons() {
            return Response::with_message("insufficient payload");
        }

        let session = Session { user };
        debug!(command, username = %session.user.username, "dispatching");
        match handler.execute(request, &session, &self.list).await {
            Ok(response) => response,
            Err(CommandError::NotOwner) => Response::with_message("not owner"),
            Err(CommandError::Store(err)) => store_error_response(&err),
        }
    }

    /// Registration runs before authentication: the credentials carried by
    /// the request name the account to create.
    async fn handle_register(&self, request: &Request) -> Response {
        let Some(credentials) = &request.credentials else {
            return Response::with_message(AUTH_FAILED);
        };
        match self
            .auth
            .register(&credentials.username, &credentials.password)
            .await
        {
            Ok(user) => {
                debug!(username = %user.username, id = user.id, "user registered");
                Response::with_message("Registration successful.")
            }
            Err(StoreError::DuplicateUser(username)) => Response::with_message(format!(
                "Username '{username}' is already taken."
            )),
            Err(err) => store_error_response(&err),
        }
    }
}

fn store_error_response(err: &StoreError) -> Response {
    match err {
        StoreError::Unavailable(detail) => {
            warn!(error = %detail, "store unavailable while routing");
            Response::with_message("database unavailable")
        }
        StoreError::Constraint(_) | StoreError::DuplicateUser(_) => {
            Response::with_message("invalid data")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use roster_core::protocol::{Credentials, PersonPayload, Request};

    async fn router_with_user() -> Router {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone());
        auth.register("alice", "pw").await.unwrap();
        let list = Arc::new(PersonList::load(store).await.unwrap());
        Router::new(CommandRegistry::with_default_commands(), auth, list)
    }

    fn creds(username: &str, password: &str) -> Option<Credentials> {
        Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn request(command: &str, credentials: Option<Credentials>) -> Request {
        Request::new(command, Vec::new(), Vec::new(), credentials)
    }

    #[tokio::test]
    async fn blank_command_yields_empty_response() {
        let router = router_with_user().await;
        let response = router.route(&request("  ", creds("alice", "pw"))).await;
        assert_eq!(response, Response::empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_uniform() {
        let router = router_with_user().await;
        let wrong = router.route(&request("show", creds("alice", "bad"))).await;
        let unknown = router.route(&request("show", creds("mallory", "pw"))).await;
        let missing = router.route(&request("show", None)).await;
        assert_eq!(wrong.message, AUTH_FAILED);
        assert_eq!(unknown.message, AUTH_FAILED);
        assert_eq!(missing.message, AUTH_FAILED);
    }

    #[tokio::test]
    async fn unknown_command_names_itself() {
        let router = router_with_user().await;
        let response = router.route(&request("floop", creds("alice", "pw"))).await;
        assert_eq!(
            response.message,
            "command 'floop' not found, type 'help' for help"
        );
    }

    #[tokio::test]
    async fn arity_shortfall_is_reported() {
        let router = router_with_user().await;
        let response = router.route(&request("add", creds("alice", "pw"))).await;
        assert_eq!(response.message, "insufficient payload");
    }

    #[tokio::test]
    async fn help_enumerates_commands() {
        let router = router_with_user().await;
        let response = router.route(&request("help", creds("alice", "pw"))).await;
        assert!(response.message.starts_with("Available commands:"));
        assert!(response.message.contains("remove_greater"));
    }

    #[tokio::test]
    async fn help_requires_authentication() {
        let router = router_with_user().await;
        let response = router.route(&request("help", creds("alice", "bad"))).await;
        assert_eq!(response.message, AUTH_FAILED);
    }

    #[tokio::test]
    async fn register_and_duplicate_register() {
        let router = router_with_user().await;
        let ok = router.route(&request("register", creds("bob", "x"))).await;
        assert_eq!(ok.message, "Registration successful.");

        let dup = router.route(&request("register", creds("bob", "x"))).await;
        assert_eq!(dup.message, "Username 'bob' is already taken.");
    }

    #[tokio::test]
    async fn invalid_person_payload_is_a_normal_response() {
        let router = router_with_user().await;
        let mut req = request("add", creds("alice", "pw"));
        req.persons.push(PersonPayload::default());
        let response = router.route(&req).await;
        assert!(response.message.starts_with("invalid data"));
    }

    #[tokio::test]
    async fn not_owner_is_surfaced_for_foreign_records() {
        let router = router_with_user().await;
        router.route(&request("register", creds("bob", "x"))).await;

        // alice adds, bob tries to remove.
        let mut add = request("add", creds("alice", "pw"));
        add.persons.push(PersonPayload {
            name: "A".to_string(),
            coordinates: Some(roster_core::protocol::messages::CoordinatesPayload {
                x: 0,
                y: 0,
            }),
            height: 170,
            weight: 70,
            hair_color: "BLUE".to_string(),
            nationality: "USA".to_string(),
            location: Some(roster_core::protocol::messages::LocationPayload {
                x: 1.0,
                y: None,
                name: None,
            }),
            ..PersonPayload::default()
        });
        assert_eq!(router.route(&add).await.message, "Person added.");

        let mut remove = request("remove_by_id", creds("bob", "x"));
        remove.args.push("1".to_string());
        assert_eq!(router.route(&remove).await.message, "not owner");
    }
}
