//! Game operations as the HTTP layer calls them.
//!
//! Every operation takes the id of the authenticated user and enforces
//! that only the two players of a game can see, change, delete or wait on
//! it.
//!
//! # Long polling
//!
//! ```text
//! wait_for_change(user, game, since)
//!   ├── load + participant check ──→ NotFound / NotParticipant (no registration made)
//!   ├── hub.subscribe(game)       ──→ Closed if shutting down
//!   ├── since given and store has a newer version? ──→ Delivered(current)
//!   └── subscription.wait(deadline, cancel)
//! ```
//!
//! Subscribing *before* re-reading the store closes the gap where an update
//! lands between the client's last read and its registration: the update is
//! either visible in the re-read or published to the registration.

use std::sync::Arc;
use std::time::Duration;

use netgo_hub::WaitOutcome;
use netgo_protocol::{Color, GameId, UserId};
use netgo_session::UserStore;
use tokio_util::sync::CancellationToken;

use crate::{Game, GameError, GameStore, GameView, NewGame, Seat, UpdatePublisher};

/// Game operations, shared by every request handler.
#[derive(Clone)]
pub struct GameService {
    store: Arc<dyn GameStore>,
    users: Arc<dyn UserStore>,
    publisher: UpdatePublisher,
}

impl GameService {
    pub fn new(
        store: Arc<dyn GameStore>,
        users: Arc<dyn UserStore>,
        publisher: UpdatePublisher,
    ) -> Self {
        Self {
            store,
            users,
            publisher,
        }
    }

    pub fn publisher(&self) -> &UpdatePublisher {
        &self.publisher
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Loads a game `user` plays in.
    ///
    /// # Errors
    /// - [`GameError::NotFound`]
    /// - [`GameError::NotParticipant`]
    pub async fn get(&self, user: UserId, id: GameId) -> Result<Game, GameError> {
        let game = self.store.get(id).await?.ok_or(GameError::NotFound(id))?;
        if !game.is_participant(user) {
            tracing::debug!(%user, game_id = %id, "non-participant denied");
            return Err(GameError::NotParticipant { user, game: id });
        }
        Ok(game)
    }

    pub async fn list_by_user(&self, user: UserId) -> Result<Vec<Game>, GameError> {
        self.store.list_by_user(user).await
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Creates a game from a client's description.
    ///
    /// The creator must sit in the seat of the colour they picked
    /// (`PlayerColor`); the other seat names the opponent, who must have an
    /// account.
    ///
    /// # Errors
    /// - [`GameError::Invalid`] — both seats name the same player
    /// - [`GameError::SeatMismatch`] — the creator is not in their chosen seat
    /// - [`GameError::OpponentNotFound`]
    /// - [`GameError::Protocol`] — malformed board
    pub async fn create(&self, creator: Seat, view: &GameView) -> Result<Game, GameError> {
        if view.black_player_name == view.white_player_name {
            return Err(GameError::Invalid(
                "black and white must be different players".into(),
            ));
        }

        let color = view.player_color;
        if view.player_name(color) != creator.username {
            return Err(GameError::SeatMismatch(format!(
                "{} does not hold the {color:?} seat",
                creator.username
            )));
        }

        let opponent_name = view.player_name(color.opponent());
        let opponent = self
            .users
            .find_by_username(opponent_name)
            .await
            .map_err(|e| GameError::Store(e.to_string()))?
            .ok_or_else(|| GameError::OpponentNotFound(opponent_name.to_string()))?;
        let opponent = Seat {
            user_id: opponent.id,
            username: opponent.username,
        };

        let (black_player, white_player) = match color {
            Color::Black => (creator, opponent),
            Color::White => (opponent, creator),
        };

        let game = self
            .store
            .create(NewGame {
                board: view.board()?,
                history: view.history.clone(),
                last_move_white: view.last_move_white,
                last_move_black: view.last_move_black,
                is_over: view.is_over,
                score: view.score,
                black_player,
                white_player,
            })
            .await?;

        tracing::info!(
            game_id = %game.id,
            black = %game.black_player.user_id,
            white = %game.white_player.user_id,
            "game started"
        );
        Ok(game)
    }

    /// Commits a new play state, then wakes everyone waiting on the game.
    ///
    /// The publish happens strictly after the store accepted the write and
    /// cannot fail the update.
    pub async fn update(&self, user: UserId, id: GameId, view: &GameView) -> Result<Game, GameError> {
        let mut game = self.get(user, id).await?;
        view.apply_to(&mut game)?;

        let committed = self.store.update(game).await?;
        self.publisher.publish(&committed);
        Ok(committed)
    }

    /// Deletes a game `user` plays in.
    pub async fn delete(&self, user: UserId, id: GameId) -> Result<(), GameError> {
        self.get(user, id).await?;
        if !self.store.delete(id).await? {
            return Err(GameError::NotFound(id));
        }
        tracing::info!(%user, game_id = %id, "game removed by player");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Long poll
    // -----------------------------------------------------------------------

    /// Waits for the next committed update of a game.
    ///
    /// With `since`, a version newer than it that is already committed is
    /// returned at once. Without it, only updates committed after the
    /// registration count.
    ///
    /// Exactly one hub registration is made and removed per call. An
    /// authorization failure returns before any is made.
    pub async fn wait_for_change(
        &self,
        user: UserId,
        id: GameId,
        since: Option<u64>,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome<Game>, GameError> {
        self.get(user, id).await?;

        let subscription = match self.publisher.hub().subscribe(id) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::debug!(%user, game_id = %id, error = %e, "long poll refused");
                return Ok(WaitOutcome::Closed);
            }
        };

        if let Some(since) = since {
            let current = self.store.get(id).await?.ok_or(GameError::NotFound(id))?;
            if current.version > since {
                tracing::debug!(%user, game_id = %id, since, version = current.version, "already newer");
                return Ok(WaitOutcome::Delivered(current));
            }
        }

        tracing::debug!(%user, game_id = %id, registration = %subscription.id(), "long poll waiting");
        let outcome = subscription.wait(deadline, cancel).await;
        tracing::debug!(%user, game_id = %id, delivered = outcome.is_delivered(), "long poll finished");
        Ok(outcome)
    }
}
