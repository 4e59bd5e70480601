//! The `User` record.

/// A registered account as stored in the `users` table.
///
/// Only the SHA-224 hex digest of the password is ever held; the plaintext
/// exists solely inside a framed request on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Store-assigned surrogate key.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Lowercase-hex SHA-224 digest of the password (56 characters).
    pub password_hash: String,
}

impl UserRecord {
    #[must_use]
    pub fn new(id: i64, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}
