//! Error types for the game layer.

use netgo_protocol::{GameId, ProtocolError, UserId};

/// Errors that can occur during game operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The game does not exist.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The user is not one of the game's two players.
    #[error("user {user} does not play in game {game}")]
    NotParticipant { user: UserId, game: GameId },

    /// The requested seating does not put the requesting user in the seat
    /// of the colour they chose.
    #[error("{0}")]
    SeatMismatch(String),

    /// The game description is self-contradictory, e.g. both seats name
    /// the same player.
    #[error("invalid game: {0}")]
    Invalid(String),

    /// The named opponent has no account.
    #[error("user {0} not found")]
    OpponentNotFound(String),

    /// A board or move in the request was malformed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backing store failed.
    #[error("game store failure: {0}")]
    Store(String),
}
