//! # netgo
//!
//! HTTP backend for playing Go between two accounts, with long polling for
//! live updates.
//!
//! The crate wires the layers below into an axum server:
//!
//! ```text
//! netgo (this crate)  ← routes, cookies, error mapping, shutdown
//!   ├── netgo-game     ← games, storage, update fan-out
//!   │     └── netgo-hub ← per-game subscription hub
//!   ├── netgo-session  ← credentials, token rotation, accounts
//!   └── netgo-protocol ← ids and board types
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netgo::prelude::*;
//!
//! # async fn start() -> Result<(), NetgoError> {
//! let server = NetgoServer::builder().build().await?;
//! server.run().await
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handler;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

pub use config::{LogFormat, ServerConfig};
pub use error::{ApiError, ErrorKind, NetgoError};
pub use routes::router;
pub use server::{NetgoServer, NetgoServerBuilder};
pub use shutdown::ShutdownCoordinator;
pub use state::AppState;

/// Common imports for running a server.
pub mod prelude {
    pub use crate::{AppState, NetgoError, NetgoServer, ServerConfig, ShutdownCoordinator};
    pub use netgo_game::{GameService, GameView};
    pub use netgo_session::{Authenticator, SessionConfig};
}
