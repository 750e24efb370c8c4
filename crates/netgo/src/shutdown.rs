//! Graceful shutdown.
//!
//! ```text
//! SIGINT / SIGTERM / trigger()
//!        │
//!        ▼
//!   token cancelled ──→ hub.shutdown_all()  (every long poll answers 503)
//!        │              axum stops accepting, drains in-flight requests
//!        ▼
//!   grace period elapses ──→ run() returns even if requests remain
//! ```
//!
//! A second Ctrl+C exits immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use netgo_game::GameHub;
use tokio_util::sync::CancellationToken;

/// Owns the server's shutdown token and the order of shutdown steps.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    hub: GameHub,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub fn new(token: CancellationToken, hub: GameHub, grace: Duration) -> Self {
        Self { token, hub, grace }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Starts shutdown without a signal.
    pub fn trigger(&self) {
        tracing::info!("shutdown requested");
        self.token.cancel();
    }

    /// Spawns tasks that start shutdown on SIGINT or SIGTERM.
    pub fn listen_for_signals(&self) {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let token = self.token.clone();
            tokio::spawn(async move {
                loop {
                    if tokio::signal::ctrl_c().await.is_err() {
                        tracing::warn!("cannot listen for Ctrl+C");
                        return;
                    }
                    match hits.fetch_add(1, Ordering::Relaxed) {
                        0 => {
                            tracing::info!("Ctrl+C received, shutting down (press again to force)");
                            token.cancel();
                        }
                        _ => {
                            tracing::warn!("second Ctrl+C, exiting now");
                            std::process::exit(130);
                        }
                    }
                }
            });
        }

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let token = self.token.clone();
            tokio::spawn(async move {
                match signal(SignalKind::terminate()) {
                    Ok(mut term) => {
                        term.recv().await;
                        tracing::info!("SIGTERM received, shutting down");
                        token.cancel();
                    }
                    Err(e) => tracing::warn!(error = %e, "cannot listen for SIGTERM"),
                }
            });
        }
    }

    /// Resolves when shutdown starts, after every pending long poll has
    /// been woken. Handed to axum's graceful shutdown.
    pub async fn begin(self) {
        self.token.cancelled().await;
        let woken = self.hub.shutdown_all();
        tracing::info!(woken, grace_secs = self.grace.as_secs(), "draining connections");
    }

    /// Resolves one grace period after shutdown started.
    pub async fn grace_expired(&self) {
        self.token.cancelled().await;
        tokio::time::sleep(self.grace).await;
    }
}
