//! The client-facing game shape.
//!
//! Clients read and write games as a flat JSON record with PascalCase
//! keys. The same [`Game`] renders differently per viewer: `PlayerColor` is
//! always the colour of whoever is asking.
//!
//! ```json
//! {
//!   "ID": "7",
//!   "BoardSize": 19,
//!   "Board": [0, 1, -1, ...],
//!   "LastMoveWhite": null,
//!   "LastMoveBlack": { "moveType": 1, "piece": 1, "coord": 60 },
//!   "History": [ ... ],
//!   "IsOver": false,
//!   "Score": { "ForfeitColor": null, "BlackPoints": 0, "WhitePoints": 0, "Komi": 6.5 },
//!   "PlayerColor": "black",
//!   "BlackPlayerName": "tim",
//!   "WhitePlayerName": "sally",
//!   "Version": 3
//! }
//! ```

use netgo_protocol::{Board, BoardSize, Color, Move, Piece, ProtocolError, Score, UserId};
use serde::{Deserialize, Serialize};

use crate::Game;

/// A game as one particular player sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameView {
    /// Decimal game id. Empty on create requests.
    #[serde(rename = "ID", default)]
    pub id: String,
    pub board_size: BoardSize,
    /// Row-major, `BoardSize * BoardSize` entries, or empty before the
    /// first stone.
    #[serde(default)]
    pub board: Vec<Piece>,
    #[serde(default)]
    pub last_move_white: Option<Move>,
    #[serde(default)]
    pub last_move_black: Option<Move>,
    #[serde(default)]
    pub history: Vec<Move>,
    #[serde(default)]
    pub is_over: bool,
    #[serde(default)]
    pub score: Score,
    pub player_color: Color,
    #[serde(default)]
    pub black_player_name: String,
    #[serde(default)]
    pub white_player_name: String,
    /// Ignored on input.
    #[serde(default)]
    pub version: u64,
}

impl GameView {
    /// Renders `game` for `viewer`.
    ///
    /// A viewer who does not hold the white seat is shown black; callers
    /// check participation before rendering.
    pub fn from_game(game: &Game, viewer: UserId) -> Self {
        let player_color = if game.white_player.user_id == viewer {
            Color::White
        } else {
            Color::Black
        };

        Self {
            id: game.id.0.to_string(),
            board_size: game.board.size,
            board: game.board.to_flat(),
            last_move_white: game.last_move_white,
            last_move_black: game.last_move_black,
            history: game.history.clone(),
            is_over: game.is_over,
            score: game.score,
            player_color,
            black_player_name: game.black_player.username.clone(),
            white_player_name: game.white_player.username.clone(),
            version: game.version,
        }
    }

    /// Rebuilds the board grid from the flat array.
    pub fn board(&self) -> Result<Board, ProtocolError> {
        Board::from_flat(self.board_size, &self.board)
    }

    /// The name in the seat of `color`.
    pub fn player_name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white_player_name,
            Color::Black => &self.black_player_name,
        }
    }

    /// Copies the play state (board, moves, score, end flag) onto `game`.
    ///
    /// Seats and id are left alone: an update can move stones, it cannot
    /// change who is playing.
    pub fn apply_to(&self, game: &mut Game) -> Result<(), ProtocolError> {
        game.board = self.board()?;
        game.history = self.history.clone();
        game.last_move_white = self.last_move_white;
        game.last_move_black = self.last_move_black;
        game.is_over = self.is_over;
        game.score = self.score;
        Ok(())
    }
}
