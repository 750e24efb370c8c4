//! Wire types for netgo.
//!
//! This crate defines the values that travel between clients and the
//! server:
//!
//! - **Identity** ([`UserId`], [`GameId`]) — who is asking, and about what.
//! - **Board primitives** ([`Board`], [`Piece`], [`Move`], [`Score`], ...) —
//!   the pieces of a game snapshot.
//! - **Errors** ([`ProtocolError`]) — what can be wrong with a wire value.
//!
//! It knows nothing about sessions, storage, or HTTP.

mod board;
mod error;
mod types;

pub use board::{Board, BoardSize, Color, Move, MoveType, Piece, Score};
pub use error::ProtocolError;
pub use types::{GameId, UserId};
