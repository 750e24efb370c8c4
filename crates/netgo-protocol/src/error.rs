//! Error types for the protocol layer.
//!
//! Each crate in netgo defines its own error enum. A `ProtocolError` always
//! means a value was malformed on the wire, never that a lookup failed.

/// Errors raised while parsing wire values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An identifier was not an unsigned integer.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A board, piece, or move value is outside the known set, or a flat
    /// board does not split into whole rows.
    #[error("invalid board: {0}")]
    InvalidBoard(String),
}
