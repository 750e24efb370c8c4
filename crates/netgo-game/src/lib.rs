//! Games for netgo: the stored record, its client-facing view, storage,
//! and the service that ties them to the subscription hub.
//!
//! # Key types
//!
//! - [`Game`] — the stored record, also the payload broadcast on update
//! - [`GameView`] — the per-viewer JSON shape clients read and write
//! - [`GameStore`] / [`MemoryGameStore`] — persistence
//! - [`UpdatePublisher`] — wakes long-poll waiters after a commit
//! - [`GameService`] — authorization plus every game operation, including
//!   [`GameService::wait_for_change`]

mod error;
mod model;
mod publisher;
mod service;
mod store;
mod view;

pub use error::GameError;
pub use model::{Game, NewGame, Seat};
pub use publisher::{GameHub, UpdatePublisher};
pub use service::GameService;
pub use store::{GameStore, MemoryGameStore};
pub use view::GameView;
