//! Argon2id password hashing.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use std::sync::OnceLock;

use crate::SessionError;

/// Hash checked against when the username is unknown, so a failed sign-in
/// costs one Argon2 verification either way.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Hashes and verifies passwords with Argon2id and a random salt per hash.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, SessionError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| SessionError::Hashing(e.to_string()))
    }

    /// Returns `Ok(false)` on a mismatch and `Err` only when the stored hash
    /// itself is unusable.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, SessionError> {
        let parsed = PasswordHash::new(hash).map_err(|e| SessionError::Hashing(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(SessionError::Hashing(e.to_string())),
        }
    }

    /// Runs a verification that always fails, for sign-ins naming no user.
    pub fn verify_dummy(&self, password: &str) {
        if let Some(hash) = self.dummy_hash() {
            let _ = self.verify(password, hash);
        }
    }

    fn dummy_hash(&self) -> Option<&'static str> {
        DUMMY_HASH
            .get_or_init(|| self.hash("netgo-unknown-user").ok())
            .as_deref()
    }
}
