//! Identity types shared by every layer of netgo.
//!
//! Both identifiers are "newtype wrappers" around `u64`. The wrapper keeps
//! a `GameId` from being passed where a `UserId` is expected, even though
//! both are plain integers on the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// A unique identifier for a registered user.
///
/// `#[serde(transparent)]` serializes a `UserId(42)` as just `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// Parses the bare decimal form (`"42"`), which is what credentials carry.
impl FromStr for UserId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(UserId).map_err(|_| {
            ProtocolError::InvalidId(format!("expected unsigned user id, got {s:?}"))
        })
    }
}

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// A unique identifier for a game. Games are the resources that long-poll
/// clients subscribe to, so this is also the subscription key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

impl FromStr for GameId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(GameId).map_err(|_| {
            ProtocolError::InvalidId(format!("expected unsigned game id, got {s:?}"))
        })
    }
}
