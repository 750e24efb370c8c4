//! The client-held credential: `"<user id>::<token>"`.
//!
//! A credential is never stored on the server. It is rebuilt from the
//! request on every call and checked against the user's current
//! [`Session`](crate::Session) token.

use std::fmt;
use std::str::FromStr;

use netgo_protocol::UserId;

use crate::{Session, SessionError};

/// Separator between the user id and the token.
pub const CREDENTIAL_SEPARATOR: &str = "::";

/// A decoded credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: UserId,
    pub token: String,
}

impl Credential {
    /// The credential a client should hold for `session`.
    pub fn for_session(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            token: session.token.clone(),
        }
    }
}

/// Keeps the token out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Encodes to the wire form. Uses the bare id, not `UserId`'s `Display`.
impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{CREDENTIAL_SEPARATOR}{}", self.user_id.0, self.token)
    }
}

impl FromStr for Credential {
    type Err = SessionError;

    /// Decodes the wire form.
    ///
    /// Every failure is [`SessionError::Unauthenticated`]; the specific
    /// reason only goes to the debug log.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(CREDENTIAL_SEPARATOR).collect();
        let [id, token] = parts.as_slice() else {
            tracing::debug!(parts = parts.len(), "credential has wrong shape");
            return Err(SessionError::Unauthenticated);
        };

        let user_id: UserId = id.parse().map_err(|e| {
            tracing::debug!(error = %e, "credential user id is not numeric");
            SessionError::Unauthenticated
        })?;

        if token.is_empty() {
            tracing::debug!(%user_id, "credential token is empty");
            return Err(SessionError::Unauthenticated);
        }

        Ok(Self {
            user_id,
            token: (*token).to_string(),
        })
    }
}
