//! Credential verification and registration.
//!
//! Gates every routed request. Verification never reveals which side was
//! wrong: an unknown username and a bad password are indistinguishable to
//! the caller, and the digest comparison itself runs in constant time.

use std::sync::Arc;

use roster_core::credentials::{hash_password, verify_password};
use roster_core::protocol::Credentials;
use roster_core::user::UserRecord;
use tracing::debug;

use crate::store::{StoreError, UserStore};

/// The credential service over the user store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Resolves and verifies the session user.
    ///
    /// Returns `Ok(None)` both when the username is unknown and when the
    /// password does not match.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the router turns those into a
    /// database-unavailable response rather than an auth failure.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<UserRecord>, StoreError> {
        let Some(user) = self
            .users
            .find_user_by_username(&credentials.username)
            .await?
        else {
            debug!(username = %credentials.username, "unknown username");
            return Ok(None);
        };

        if verify_password(&user.password_hash, &credentials.password) {
            Ok(Some(user))
        } else {
            debug!(username = %credentials.username, "password mismatch");
            Ok(None)
        }
    }

    /// Registers a new account, hashing the plaintext before it is stored.
    ///
    /// # Errors
    ///
    /// [`StoreError::DuplicateUser`] when the username is taken,
    /// [`StoreError::Constraint`] for an empty username.
    pub async fn register(
        &self,
        username: &str,
        plaintext: &str,
    ) -> Result<UserRecord, StoreError> {
        if username.trim().is_empty() {
            return Err(StoreError::Constraint("username can't be empty".to_string()));
        }
        if self.users.exists_user_by_username(username).await? {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }
        self.users.save_user(username, &hash_password(plaintext)).await
    }
}
