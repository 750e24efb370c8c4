//! Error types for the session layer.

/// Errors that can occur while authenticating or managing accounts.
///
/// Note what is *missing*: there is no "unknown user" or "wrong token"
/// variant. Every credential failure collapses into
/// [`SessionError::Unauthenticated`] so callers cannot tell which part of
/// a credential was wrong.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential was missing, malformed, stale, or named an unknown
    /// user. The caller should discard the credential it presented.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Sign-in failed. Unknown usernames and wrong passwords both land
    /// here, with the attempted username for the response message.
    #[error("user {0} not found")]
    InvalidLogin(String),

    /// Sign-up picked a username that already exists.
    #[error("username {0} already exists")]
    UsernameTaken(String),

    /// No user record exists for this id. Only raised by store operations
    /// that are not part of the authentication path (e.g. `rotate`).
    #[error("user {0} does not exist")]
    UnknownUser(netgo_protocol::UserId),

    /// Password hashing or verification failed for a reason other than a
    /// mismatch (corrupt hash, allocator failure, ...).
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
