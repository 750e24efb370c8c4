//! Application state shared across all handlers.

use std::sync::Arc;

use netgo_game::{GameHub, GameService, GameStore, MemoryGameStore, UpdatePublisher};
use netgo_session::{AccountService, MemoryStore, SessionAuthenticator, SessionStore, UserStore};
use tokio_util::sync::CancellationToken;

use crate::ServerConfig;

/// Passed to every handler via `State<AppState>`. Every field is cheap to
/// clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub accounts: AccountService,
    pub authenticator: Arc<SessionAuthenticator>,
    pub games: GameService,
    /// Cancelled when the server starts shutting down.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wires the services over the given stores.
    ///
    /// `users` backs both the authenticator and account management, so a
    /// token rotated by sign-in is immediately what authentication checks.
    pub fn new<U: UserStore>(
        config: ServerConfig,
        users: Arc<U>,
        games: Arc<dyn GameStore>,
        hub: GameHub,
        shutdown: CancellationToken,
    ) -> Self {
        let sessions: Arc<dyn SessionStore> = users.clone();
        let accounts: Arc<dyn UserStore> = users;

        Self {
            config: Arc::new(config),
            accounts: AccountService::new(accounts.clone()),
            authenticator: Arc::new(SessionAuthenticator::new(sessions)),
            games: GameService::new(games, accounts, UpdatePublisher::new(hub)),
            shutdown,
        }
    }

    /// State over empty in-memory stores and a fresh hub.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryGameStore::new()),
            GameHub::new(),
            CancellationToken::new(),
        )
    }

    pub fn hub(&self) -> &GameHub {
        self.games.publisher().hub()
    }
}
