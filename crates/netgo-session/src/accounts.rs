//! Sign-up and sign-in.
//!
//! Both operations end by rotating the user's session token, so every
//! successful authentication event revokes all previously issued
//! credentials for that user.
//!
//! ```text
//! signup(name, pw) ──→ hash ──→ store.create ──→ store.rotate ──→ Session
//! signin(name, pw) ──→ store.find ──→ verify ──→ store.rotate ──→ Session
//! ```

use std::sync::Arc;

use crate::{PasswordHasher, Session, SessionError, UserStore};

/// Creates accounts and signs users in.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
        }
    }

    /// Creates a user and returns its freshly rotated session.
    ///
    /// # Errors
    /// - [`SessionError::UsernameTaken`] — the username exists
    /// - [`SessionError::Hashing`] — hashing failed
    pub async fn signup(&self, username: &str, password: &str) -> Result<Session, SessionError> {
        let hash = self.hasher.hash(password)?;
        let user = self.store.create(username, hash).await?;
        let session = self.store.rotate(user.id).await?;
        tracing::info!(user_id = %user.id, "user signed up");
        Ok(session)
    }

    /// Checks the password and returns a freshly rotated session.
    ///
    /// # Errors
    /// [`SessionError::InvalidLogin`] for an unknown username *and* for a
    /// wrong password; callers cannot tell which.
    pub async fn signin(&self, username: &str, password: &str) -> Result<Session, SessionError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            tracing::debug!(username, "signin for unknown username");
            self.hasher.verify_dummy(password);
            return Err(SessionError::InvalidLogin(username.to_string()));
        };

        let matches = self
            .hasher
            .verify(password, &user.password_hash)
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %user.id, error = %e, "stored password hash unusable");
                false
            });
        if !matches {
            tracing::debug!(user_id = %user.id, "signin with wrong password");
            return Err(SessionError::InvalidLogin(username.to_string()));
        }

        let session = self.store.rotate(user.id).await?;
        tracing::info!(user_id = %user.id, "user signed in");
        Ok(session)
    }

    /// Rotates a user's token without a password check, revoking every
    /// credential issued so far.
    pub async fn revoke_all(&self, user_id: netgo_protocol::UserId) -> Result<Session, SessionError> {
        let session = self.store.rotate(user_id).await?;
        tracing::info!(%user_id, "all credentials revoked");
        Ok(session)
    }

    /// The underlying store, for callers that need user lookups.
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }
}
