//! Credential authentication.
//!
//! [`Authenticator`] is the hook every request passes through before it can
//! reach game data, including long polls. [`SessionAuthenticator`] is the
//! implementation backed by a [`SessionStore`]: decode the credential, look
//! up the user's session, compare tokens.
//!
//! # Uniform failure
//!
//! A malformed credential, an unknown user and a stale token all produce the
//! same [`SessionError::Unauthenticated`]. The token comparison also runs in
//! time that depends only on the lengths involved, not on how many leading
//! characters matched.

use std::sync::Arc;

use netgo_protocol::UserId;

use crate::{Credential, SessionError, SessionStore};

/// The identity an authenticated request runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
}

/// Validates a client's credential and returns their identity.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared by every request task.
/// - `'static` → lives as long as the server.
///
/// The returned future is `Send` so axum handlers that await it stay
/// spawnable on the multi-threaded runtime.
///
/// # Example
///
/// ```rust
/// use netgo_session::{Authenticator, Identity, SessionError};
/// use netgo_protocol::UserId;
///
/// /// Trusts the whole credential as a numeric user id. Tests only!
/// struct TrustingAuthenticator;
///
/// impl Authenticator for TrustingAuthenticator {
///     async fn authenticate(&self, credential: &str) -> Result<Identity, SessionError> {
///         let id: u64 = credential.parse().map_err(|_| SessionError::Unauthenticated)?;
///         Ok(Identity { user_id: UserId(id), display_name: format!("user{id}") })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the raw credential string.
    ///
    /// # Returns
    /// - `Ok(Identity)` — the credential carries the user's current token
    /// - `Err(SessionError::Unauthenticated)` — anything else
    fn authenticate(
        &self,
        credential: &str,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}

/// [`Authenticator`] that checks credentials against a [`SessionStore`].
#[derive(Clone)]
pub struct SessionAuthenticator {
    store: Arc<dyn SessionStore>,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Authenticates an already-decoded credential.
    pub async fn verify(&self, credential: &Credential) -> Result<Identity, SessionError> {
        let user_id = credential.user_id;

        let session = match self.store.lookup(user_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!(%user_id, "credential names unknown user");
                return Err(SessionError::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "session lookup failed");
                return Err(SessionError::Unauthenticated);
            }
        };

        if !tokens_match(credential.token.as_bytes(), session.token.as_bytes()) {
            tracing::debug!(%user_id, "credential token is stale");
            return Err(SessionError::Unauthenticated);
        }

        Ok(Identity {
            user_id,
            display_name: session.username,
        })
    }
}

impl Authenticator for SessionAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<Identity, SessionError> {
        let credential: Credential = credential.parse()?;
        self.verify(&credential).await
    }
}

/// Compares two tokens without an early exit on the first differing byte.
fn tokens_match(presented: &[u8], current: &[u8]) -> bool {
    let mut diff = presented.len() ^ current.len();
    for i in 0..presented.len().max(current.len()) {
        let a = presented.get(i).copied().unwrap_or(0);
        let b = current.get(i).copied().unwrap_or(0);
        diff |= usize::from(a ^ b);
    }
    diff == 0
}
