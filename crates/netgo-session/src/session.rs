//! Session types: a user's current token and the knobs that govern how
//! credentials are issued.

use netgo_protocol::UserId;
use rand::Rng;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for issued credentials.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the client keeps its credential cookie. Far longer than any
    /// single visit; the token rotation is what actually ends a session.
    ///
    /// Default: 30 days.
    pub credential_max_age_secs: u64,

    /// Cookie `Domain` attribute. `None` scopes the cookie to the host that
    /// served it.
    pub cookie_domain: Option<String>,

    /// Whether credential cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_max_age_secs: 30 * 24 * 60 * 60,
            cookie_domain: None,
            secure_cookies: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A user's server-side session.
///
/// There is exactly one per user and it is never deleted: signing out only
/// makes the *client* forget its credential. Signing in (anywhere) replaces
/// `token`, which silently invalidates every credential issued before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Whose session this is.
    pub user_id: UserId,

    /// Display name, carried along so an authenticated request does not
    /// need a second lookup.
    pub username: String,

    /// The only token currently accepted for this user.
    ///
    /// A 32-character hex string (128 bits of randomness).
    pub token: String,
}

/// Generates a random 32-character hex string (128 bits of entropy).
pub(crate) fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
