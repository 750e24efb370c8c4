//! # netgo-hub
//!
//! Change notification for long polling.
//!
//! A [`SubscriptionHub`] keeps, per key, the set of requests currently
//! parked waiting for that key to change. A mutator that commits a change
//! calls [`SubscriptionHub::publish`] with the new snapshot, and every
//! parked request wakes with it. Requests that see no change within their
//! deadline wake with [`WaitOutcome::TimedOut`] instead.
//!
//! The hub is generic: the server keys it by game id and carries game
//! views, but nothing here knows about games.
//!
//! ```text
//!   GET /games/7/long ──→ subscribe(7) ──→ wait(deadline) ─┐
//!                                                          │ Delivered(view)
//!   POST /games/7     ──→ commit ──→ publish(7, view) ─────┘
//! ```

mod error;
mod hub;
mod subscription;

pub use error::HubError;
pub use hub::SubscriptionHub;
pub use subscription::{RegistrationId, RegistrationState, Subscription, WaitOutcome};
