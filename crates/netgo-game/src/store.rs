//! Game persistence.
//!
//! [`GameStore`] is the seam a database-backed store plugs into.
//! [`MemoryGameStore`] keeps everything in one map behind a
//! `tokio::sync::RwLock`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use netgo_protocol::{GameId, UserId};
use tokio::sync::RwLock;

use crate::{Game, GameError, NewGame};

/// Storage for games.
#[async_trait]
pub trait GameStore: Send + Sync + 'static {
    /// Stores a new game under a fresh id and returns it at version 1.
    async fn create(&self, game: NewGame) -> Result<Game, GameError>;

    async fn get(&self, id: GameId) -> Result<Option<Game>, GameError>;

    /// Replaces the stored play state with `game`'s and returns the
    /// committed record with its version advanced by one.
    ///
    /// # Errors
    /// [`GameError::NotFound`] if the game was deleted meanwhile.
    async fn update(&self, game: Game) -> Result<Game, GameError>;

    /// Removes a game. Returns `false` if it did not exist.
    async fn delete(&self, id: GameId) -> Result<bool, GameError>;

    /// Every game in which `user` holds a seat, oldest first.
    async fn list_by_user(&self, user: UserId) -> Result<Vec<Game>, GameError>;
}

/// In-process [`GameStore`].
pub struct MemoryGameStore {
    games: RwLock<HashMap<GameId, Game>>,
    next_id: AtomicU64,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn create(&self, game: NewGame) -> Result<Game, GameError> {
        let id = GameId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let game = game.into_game(id);
        self.games.write().await.insert(id, game.clone());
        tracing::info!(game_id = %id, "game created");
        Ok(game)
    }

    async fn get(&self, id: GameId) -> Result<Option<Game>, GameError> {
        Ok(self.games.read().await.get(&id).cloned())
    }

    async fn update(&self, game: Game) -> Result<Game, GameError> {
        let mut games = self.games.write().await;
        let stored = games.get_mut(&game.id).ok_or(GameError::NotFound(game.id))?;

        stored.board = game.board;
        stored.history = game.history;
        stored.last_move_white = game.last_move_white;
        stored.last_move_black = game.last_move_black;
        stored.is_over = game.is_over;
        stored.score = game.score;
        stored.version += 1;

        tracing::debug!(game_id = %stored.id, version = stored.version, "game updated");
        Ok(stored.clone())
    }

    async fn delete(&self, id: GameId) -> Result<bool, GameError> {
        let removed = self.games.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(game_id = %id, "game deleted");
        }
        Ok(removed)
    }

    async fn list_by_user(&self, user: UserId) -> Result<Vec<Game>, GameError> {
        let games = self.games.read().await;
        let mut mine: Vec<Game> = games
            .values()
            .filter(|g| g.is_participant(user))
            .cloned()
            .collect();
        mine.sort_by_key(|g| g.id);
        Ok(mine)
    }
}
