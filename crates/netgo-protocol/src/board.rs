//! Board primitives: the pieces, moves, and scores that make up a game
//! snapshot on the wire.
//!
//! None of these types know the rules of Go. They only guarantee that a
//! value is well-formed (a known board size, a known piece, a board whose
//! rows are all the same width). Whether a move is *legal* is up to the
//! clients.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// BoardSize
// ---------------------------------------------------------------------------

/// The supported board dimensions.
///
/// Serialized as the bare number of lines (`19`), so the JSON stays the
/// same shape clients have always sent. `try_from = "u32"` routes
/// deserialization through [`TryFrom`], which rejects anything else,
/// including `0`, the "undefined" size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum BoardSize {
    Small,
    Medium,
    #[default]
    Full,
}

impl BoardSize {
    /// Number of intersections along one edge.
    pub fn lines(self) -> usize {
        match self {
            Self::Small => 9,
            Self::Medium => 13,
            Self::Full => 19,
        }
    }
}

impl TryFrom<u32> for BoardSize {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            9 => Ok(Self::Small),
            13 => Ok(Self::Medium),
            19 => Ok(Self::Full),
            other => Err(ProtocolError::InvalidBoard(format!(
                "unsupported board size {other}"
            ))),
        }
    }
}

impl From<BoardSize> for u32 {
    fn from(size: BoardSize) -> Self {
        size.lines() as u32
    }
}

// ---------------------------------------------------------------------------
// Piece / Color
// ---------------------------------------------------------------------------

/// What occupies a single intersection. Encoded as `0`, `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i8", into = "i8")]
pub enum Piece {
    #[default]
    None,
    Black,
    White,
}

impl TryFrom<i8> for Piece {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Black),
            -1 => Ok(Self::White),
            other => Err(ProtocolError::InvalidBoard(format!(
                "unknown piece value {other}"
            ))),
        }
    }
}

impl From<Piece> for i8 {
    fn from(piece: Piece) -> Self {
        match piece {
            Piece::None => 0,
            Piece::Black => 1,
            Piece::White => -1,
        }
    }
}

/// A player's side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// Whether a move places a stone or passes the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum MoveType {
    #[default]
    Pass,
    PlayPiece,
}

impl TryFrom<u8> for MoveType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pass),
            1 => Ok(Self::PlayPiece),
            other => Err(ProtocolError::InvalidBoard(format!(
                "unknown move type {other}"
            ))),
        }
    }
}

impl From<MoveType> for u8 {
    fn from(kind: MoveType) -> Self {
        match kind {
            MoveType::Pass => 0,
            MoveType::PlayPiece => 1,
        }
    }
}

/// One entry in a game's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub move_type: MoveType,
    pub piece: Piece,
    /// Flat index into the board. Always `0` for a pass.
    pub coord: u32,
}

impl Move {
    pub fn is_pass(&self) -> bool {
        self.move_type == MoveType::Pass
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Running or final score of a game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Score {
    /// `None` unless the game ended because this side forfeited.
    pub forfeit_color: Option<Color>,
    pub black_points: f32,
    pub white_points: f32,
    pub komi: f32,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A square grid of pieces, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Board {
    pub size: BoardSize,
    pub map: Vec<Vec<Piece>>,
}

impl Board {
    /// An empty board of the given size.
    pub fn empty(size: BoardSize) -> Self {
        let n = size.lines();
        Self {
            size,
            map: vec![vec![Piece::None; n]; n],
        }
    }

    /// Builds a board from the flat, row-major array clients send.
    ///
    /// An empty array is accepted and produces a board with no rows; clients
    /// send that before the first stone is placed.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidBoard`] when the array length is not a
    /// whole number of rows.
    pub fn from_flat(size: BoardSize, flat: &[Piece]) -> Result<Self, ProtocolError> {
        let width = size.lines();
        if flat.len() % width != 0 {
            return Err(ProtocolError::InvalidBoard(format!(
                "{} pieces do not fit rows of width {width}",
                flat.len()
            )));
        }
        let map = flat.chunks(width).map(<[Piece]>::to_vec).collect();
        Ok(Self { size, map })
    }

    /// Flattens the rows back into the wire representation.
    pub fn to_flat(&self) -> Vec<Piece> {
        self.map.iter().flatten().copied().collect()
    }
}
