//! `NetgoServer` builder and serve loop.
//!
//! This is the entry point for running a netgo server. It ties together
//! all the layers: config → stores → session/game services → router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use netgo_game::{GameHub, GameStore, MemoryGameStore};
use netgo_session::{MemoryStore, UserStore};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::routes::router;
use crate::shutdown::ShutdownCoordinator;
use crate::state::AppState;
use crate::{NetgoError, ServerConfig};

/// Builder for configuring and starting a netgo server.
///
/// # Example
///
/// ```rust,no_run
/// use netgo::prelude::*;
///
/// # async fn start() -> Result<(), NetgoError> {
/// let server = NetgoServer::builder()
///     .config(ServerConfig::from_env()?)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NetgoServerBuilder<U: UserStore = MemoryStore> {
    config: ServerConfig,
    users: Arc<U>,
    games: Arc<dyn GameStore>,
}

impl NetgoServerBuilder<MemoryStore> {
    /// Creates a new builder with default settings and in-memory stores.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            users: Arc::new(MemoryStore::new()),
            games: Arc::new(MemoryGameStore::new()),
        }
    }
}

impl Default for NetgoServerBuilder<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: UserStore> NetgoServerBuilder<U> {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn long_poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.long_poll_timeout = timeout;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace = grace;
        self
    }

    /// Uses a different user store.
    pub fn user_store<V: UserStore>(self, users: Arc<V>) -> NetgoServerBuilder<V> {
        NetgoServerBuilder {
            config: self.config,
            users,
            games: self.games,
        }
    }

    /// Uses a different game store.
    pub fn game_store(mut self, games: Arc<dyn GameStore>) -> Self {
        self.games = games;
        self
    }

    /// Binds the listener and wires the services.
    pub async fn build(self) -> Result<NetgoServer, NetgoError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        let hub = GameHub::new();
        let token = CancellationToken::new();
        let shutdown = ShutdownCoordinator::new(token.clone(), hub.clone(), self.config.shutdown_grace);
        let state = AppState::new(self.config, self.users, self.games, hub, token);

        Ok(NetgoServer {
            listener,
            router: router(state.clone()),
            state,
            shutdown,
        })
    }
}

/// A bound netgo server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct NetgoServer {
    listener: TcpListener,
    router: Router,
    state: AppState,
    shutdown: ShutdownCoordinator,
}

impl NetgoServer {
    pub fn builder() -> NetgoServerBuilder {
        NetgoServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Handle for starting shutdown from outside, e.g. in tests.
    pub fn shutdown(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Serves until shutdown, then drains for at most the grace period.
    pub async fn run(self) -> Result<(), NetgoError> {
        let NetgoServer {
            listener,
            router,
            shutdown,
            ..
        } = self;

        shutdown.listen_for_signals();
        tracing::info!(addr = %listener.local_addr()?, "netgo server running");

        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.clone().begin())
            .into_future();

        tokio::select! {
            result = serve => result?,
            () = shutdown.grace_expired() => {
                tracing::warn!("grace period elapsed with requests still open");
            }
        }

        tracing::info!("netgo server stopped");
        Ok(())
    }
}
