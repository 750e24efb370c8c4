//! User sessions and credential authentication for netgo.
//!
//! This crate owns three things:
//!
//! 1. **Authentication** — turning a client credential into an
//!    [`Identity`] ([`Authenticator`], [`SessionAuthenticator`])
//! 2. **Session storage** — one rotating token per user ([`SessionStore`],
//!    [`UserStore`], [`MemoryStore`])
//! 3. **Accounts** — sign-up and sign-in, both of which rotate the token
//!    ([`AccountService`])
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (netgo)      ← reads the credential cookie, calls authenticate
//!     ↕
//! Session layer (this crate)  ← identity, token rotation
//!     ↕
//! Protocol layer          ← provides UserId
//! ```

mod accounts;
mod auth;
mod credential;
mod error;
mod password;
mod session;
mod store;

pub use accounts::AccountService;
pub use auth::{Authenticator, Identity, SessionAuthenticator};
pub use credential::{CREDENTIAL_SEPARATOR, Credential};
pub use error::SessionError;
pub use password::PasswordHasher;
pub use session::{Session, SessionConfig};
pub use store::{MemoryStore, SessionStore, User, UserStore};
