//! Persistence seams for users and their sessions.
//!
//! The authenticator only needs two operations, `lookup` and `rotate`
//! ([`SessionStore`]). Sign-up and sign-in additionally need to create and
//! find user records ([`UserStore`]). Both are traits so a database-backed
//! store can replace [`MemoryStore`] without touching the callers.
//!
//! The traits use `#[async_trait]` so they stay object-safe: the HTTP layer
//! holds them as `Arc<dyn UserStore>`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use netgo_protocol::UserId;
use tokio::sync::RwLock;

use crate::session::generate_token;
use crate::{Session, SessionError};

/// A stored user account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC-format password hash. Never leaves the server.
    pub password_hash: String,
    pub session: Session,
}

/// The two operations the authenticator depends on.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the user's current session, or `None` for an unknown user.
    async fn lookup(&self, user_id: UserId) -> Result<Option<Session>, SessionError>;

    /// Replaces the user's token with a fresh one and returns the new
    /// session.
    ///
    /// Must be atomic per user: a concurrent `lookup` sees either the old
    /// token or the new one, never a mix.
    ///
    /// # Errors
    /// [`SessionError::UnknownUser`] if no such user exists.
    async fn rotate(&self, user_id: UserId) -> Result<Session, SessionError>;
}

/// Account operations used by sign-up and sign-in.
#[async_trait]
pub trait UserStore: SessionStore {
    /// Inserts a new user and returns it. The user starts with a random
    /// token that nobody holds yet; sign-up rotates it immediately.
    ///
    /// # Errors
    /// [`SessionError::UsernameTaken`] if the username exists.
    async fn create(&self, username: &str, password_hash: String) -> Result<User, SessionError>;

    /// Finds a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, SessionError>;

    /// Finds a user by id.
    async fn get(&self, user_id: UserId) -> Result<Option<User>, SessionError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    /// Index from username to id, kept in sync with `users`.
    usernames: HashMap<String, UserId>,
}

/// In-process [`UserStore`]. Both maps sit behind one lock, so every
/// operation (including `rotate`) is atomic.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of registered users.
    pub async fn len(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn lookup(&self, user_id: UserId) -> Result<Option<Session>, SessionError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).map(|u| u.session.clone()))
    }

    async fn rotate(&self, user_id: UserId) -> Result<Session, SessionError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(SessionError::UnknownUser(user_id))?;
        user.session.token = generate_token();
        tracing::debug!(%user_id, "session token rotated");
        Ok(user.session.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, username: &str, password_hash: String) -> Result<User, SessionError> {
        let mut tables = self.tables.write().await;
        if tables.usernames.contains_key(username) {
            return Err(SessionError::UsernameTaken(username.to_string()));
        }

        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let user = User {
            id,
            username: username.to_string(),
            password_hash,
            session: Session {
                user_id: id,
                username: username.to_string(),
                token: generate_token(),
            },
        };

        tables.usernames.insert(user.username.clone(), id);
        tables.users.insert(id, user.clone());
        tracing::info!(user_id = %id, username, "user created");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, SessionError> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>, SessionError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.create("alice", "h".into()).await.unwrap();
        let b = store.create("bob", "h".into()).await.unwrap();
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_duplicate_username_fails() {
        let store = MemoryStore::new();
        store.create("alice", "h".into()).await.unwrap();
        let err = store.create("alice", "h".into()).await.unwrap_err();
        assert!(matches!(err, SessionError::UsernameTaken(name) if name == "alice"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_user_is_none() {
        let store = MemoryStore::new();
        assert!(store.lookup(UserId(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rotate_replaces_token() {
        let store = MemoryStore::new();
        let user = store.create("alice", "h".into()).await.unwrap();
        let rotated = store.rotate(user.id).await.unwrap();
        assert_ne!(rotated.token, user.session.token);

        let current = store.lookup(user.id).await.unwrap().unwrap();
        assert_eq!(current.token, rotated.token);
    }

    #[tokio::test]
    async fn test_rotate_unknown_user_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.rotate(UserId(5)).await,
            Err(SessionError::UnknownUser(UserId(5)))
        ));
    }

    #[tokio::test]
    async fn test_find_by_username_uses_index() {
        let store = MemoryStore::new();
        let user = store.create("alice", "h".into()).await.unwrap();
        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
    }
}
