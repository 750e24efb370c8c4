//! Fan-out of committed game updates to long-poll waiters.

use netgo_hub::SubscriptionHub;
use netgo_protocol::GameId;

use crate::Game;

/// The hub type the server runs: keyed by game, carrying whole games.
pub type GameHub = SubscriptionHub<GameId, Game>;

/// Announces committed games on the hub.
///
/// Only ever called after the store accepted the update. A publish that
/// reaches nobody, or hits a closed hub during shutdown, is logged and
/// otherwise ignored: the update itself already succeeded.
#[derive(Clone, Debug)]
pub struct UpdatePublisher {
    hub: GameHub,
}

impl UpdatePublisher {
    pub fn new(hub: GameHub) -> Self {
        Self { hub }
    }

    /// Sends `game` to everyone waiting on it. Returns the number reached.
    pub fn publish(&self, game: &Game) -> usize {
        match self.hub.publish(&game.id, game.clone()) {
            Ok(reached) => {
                tracing::debug!(game_id = %game.id, version = game.version, reached, "update published");
                reached
            }
            Err(e) => {
                tracing::warn!(game_id = %game.id, error = %e, "update not published");
                0
            }
        }
    }

    pub fn hub(&self) -> &GameHub {
        &self.hub
    }
}
