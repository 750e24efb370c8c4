//! The stored game record.
//!
//! A [`Game`] is what the store persists and what the subscription hub
//! broadcasts after each committed update. It carries both players, so any
//! waiter can render it from their own side (see [`GameView`]).
//!
//! [`GameView`]: crate::GameView

use netgo_protocol::{Board, Color, GameId, Move, Score, UserId};

/// One player's seat at a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub user_id: UserId,
    pub username: String,
}

/// A game as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub board: Board,
    pub history: Vec<Move>,
    pub last_move_white: Option<Move>,
    pub last_move_black: Option<Move>,
    pub is_over: bool,
    pub score: Score,
    pub black_player: Seat,
    pub white_player: Seat,
    /// Starts at 1 and goes up by one with every committed update. Clients
    /// echo it back as `since` when they open a long poll.
    pub version: u64,
}

impl Game {
    /// The colour `user` plays, or `None` for a non-participant.
    pub fn color_of(&self, user: UserId) -> Option<Color> {
        if self.white_player.user_id == user {
            Some(Color::White)
        } else if self.black_player.user_id == user {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.color_of(user).is_some()
    }

    pub fn seat(&self, color: Color) -> &Seat {
        match color {
            Color::White => &self.white_player,
            Color::Black => &self.black_player,
        }
    }
}

/// Everything needed to create a game; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub board: Board,
    pub history: Vec<Move>,
    pub last_move_white: Option<Move>,
    pub last_move_black: Option<Move>,
    pub is_over: bool,
    pub score: Score,
    pub black_player: Seat,
    pub white_player: Seat,
}

impl NewGame {
    pub(crate) fn into_game(self, id: GameId) -> Game {
        Game {
            id,
            board: self.board,
            history: self.history,
            last_move_white: self.last_move_white,
            last_move_black: self.last_move_black,
            is_over: self.is_over,
            score: self.score,
            black_player: self.black_player,
            white_player: self.white_player,
            version: 1,
        }
    }
}
