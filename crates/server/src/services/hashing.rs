//! Password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur while hashing a password.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// One-way, salted password hashing.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the underlying algorithm fails.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Returns `true` if `password` produces `hash`.
    ///
    /// An unparseable hash never verifies.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters, PHC string output.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("secret").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &hash));
        assert!(!hasher.verify("Secret", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = Argon2Hasher::new();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("secret", &second));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        let hasher = Argon2Hasher::new();
        assert!(!hasher.verify("secret", "secret"));
        assert!(!hasher.verify("secret", ""));
    }
}
