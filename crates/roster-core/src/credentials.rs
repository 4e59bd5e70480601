//! Password hashing and verification.
//!
//! Passwords are digested with unsalted SHA-224 and stored as lowercase hex.
//! This is kept bit-compatible with the existing user store so previously
//! registered accounts remain verifiable; a salted KDF (argon2, scrypt)
//! would be the upgrade path if stored hashes could be migrated.
//!
//! Verification compares digests in constant time.

use sha2::{Digest, Sha224};
use subtle::ConstantTimeEq;

/// Length of a SHA-224 digest rendered as lowercase hex.
pub const PASSWORD_HASH_LEN: usize = 56;

/// Digests a plaintext password to its canonical stored form.
///
/// Deterministic: equal inputs always produce equal digests.
#[must_use]
pub fn hash_password(plaintext: &str) -> String {
    hex::encode(Sha224::digest(plaintext.as_bytes()))
}

/// Checks `plaintext` against a stored digest in constant time.
///
/// A stored value of the wrong length never matches.
#[must_use]
pub fn verify_password(stored_hash: &str, plaintext: &str) -> bool {
    let computed = hash_password(plaintext);
    if stored_hash.len() != computed.len() {
        return false;
    }
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_56_lowercase_hex_chars() {
        let hash = hash_password("pw");
        assert_eq!(hash.len(), PASSWORD_HASH_LEN);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn known_vectors() {
        assert_eq!(
            hash_password("pw"),
            "bebeef056d2fc0c96fbdd3372c8b766a0d3b5bac45cc56a4f15235cd"
        );
        assert_eq!(
            hash_password("password"),
            "d63dc919e201d7bc4c825630d2cf25fdc93d4b2f0d46706d29038d01"
        );
        assert_eq!(
            hash_password(""),
            "d14a028c2a3a2bc9476102bb288234c415a2b01f828ea62ac5b3e42f"
        );
    }

    #[test]
    fn deterministic() {
        assert_eq!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn verify_accepts_only_the_matching_plaintext() {
        let stored = hash_password("secret");
        assert!(verify_password(&stored, "secret"));
        assert!(!verify_password(&stored, "Secret"));
        assert!(!verify_password(&stored, ""));
        assert!(!verify_password("not-a-hash", "secret"));
    }
}
