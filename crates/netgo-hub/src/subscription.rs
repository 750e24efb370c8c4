//! One waiter's registration and the wait on its delivery slot.
//!
//! A [`Subscription`] is created by [`SubscriptionHub::subscribe`] and owned
//! by exactly one waiter. The hub only keeps the sending half of the slot
//! while the registration is pending.
//!
//! # Lifecycle
//!
//! ```text
//!                  ┌──(publish)──────→ Delivered
//!                  │
//!   subscribe ──→ Pending ──(deadline)──→ TimedOut   ┐
//!                  │                                 │ removed from
//!                  ├──(cancel / drop)──→ Cancelled   │ the registry
//!                  │                                 │
//!                  └──(shutdown_all)──→ Closed       ┘
//! ```
//!
//! Every non-`Delivered` exit removes the registration before it returns.
//! Dropping a still-pending `Subscription` (e.g. because the request future
//! was dropped when the client disconnected) removes it too.
//!
//! [`SubscriptionHub::subscribe`]: crate::SubscriptionHub::subscribe

use std::fmt;
use std::hash::Hash;
use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::hub::Shared;

/// Identifies one registration within a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub(crate) u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reg-{}", self.0)
    }
}

/// What the hub puts into a delivery slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Delivery<T> {
    Snapshot(T),
    Closed,
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome<T> {
    /// A publish reached this registration.
    Delivered(T),
    /// The deadline passed with no publish.
    TimedOut,
    /// The hub shut down while waiting.
    Closed,
    /// The caller's cancellation token fired.
    Cancelled,
}

impl<T> WaitOutcome<T> {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// Where a registration is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Pending,
    Delivered,
    TimedOut,
    Cancelled,
    Closed,
}

/// A pending registration under one key.
pub struct Subscription<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    pub(crate) key: K,
    pub(crate) id: RegistrationId,
    pub(crate) registered_at: Instant,
    pub(crate) slot: oneshot::Receiver<Delivery<T>>,
    pub(crate) hub: Weak<Shared<K, T>>,
    pub(crate) state: RegistrationState,
}

impl<K, T> Subscription<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn registered_at(&self) -> Instant {
        self.registered_at
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Waits until a snapshot arrives, `deadline` elapses, `cancel` fires,
    /// or the hub shuts down, whichever is first.
    ///
    /// This is the only suspension point of a long poll. The registration
    /// is out of the hub's registry when this returns, whatever the outcome.
    pub async fn wait(mut self, deadline: Duration, cancel: &CancellationToken) -> WaitOutcome<T> {
        let outcome = tokio::select! {
            biased;

            delivery = &mut self.slot => match delivery {
                Ok(Delivery::Snapshot(snapshot)) => WaitOutcome::Delivered(snapshot),
                // A dropped sender means the hub itself is gone.
                Ok(Delivery::Closed) | Err(_) => WaitOutcome::Closed,
            },
            () = cancel.cancelled() => WaitOutcome::Cancelled,
            () = tokio::time::sleep(deadline) => WaitOutcome::TimedOut,
        };

        self.settle(outcome)
    }

    /// Records the terminal state and removes the registration if a publish
    /// did not already consume it.
    fn settle(&mut self, outcome: WaitOutcome<T>) -> WaitOutcome<T> {
        let outcome = match outcome {
            WaitOutcome::Delivered(snapshot) => {
                self.state = RegistrationState::Delivered;
                return WaitOutcome::Delivered(snapshot);
            }
            other => other,
        };

        self.remove_from_hub();

        // A publish may have taken this registration between the deadline
        // firing and the removal above. If its snapshot already landed,
        // hand it over instead of reporting a timeout.
        if let Ok(Delivery::Snapshot(snapshot)) = self.slot.try_recv() {
            self.state = RegistrationState::Delivered;
            return WaitOutcome::Delivered(snapshot);
        }

        self.state = match outcome {
            WaitOutcome::TimedOut => RegistrationState::TimedOut,
            WaitOutcome::Cancelled => RegistrationState::Cancelled,
            _ => RegistrationState::Closed,
        };
        tracing::trace!(key = ?self.key, id = %self.id, state = ?self.state, "wait ended");
        outcome
    }

    fn remove_from_hub(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(&self.key, self.id);
        }
    }
}

/// Drop guard behaviour: a registration abandoned mid-wait is removed, so a
/// dropped request future cannot leave it behind in the registry.
impl<K, T> Drop for Subscription<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    fn drop(&mut self) {
        if self.state == RegistrationState::Pending {
            self.remove_from_hub();
            self.state = RegistrationState::Cancelled;
            tracing::trace!(key = ?self.key, id = %self.id, "pending registration dropped");
        }
    }
}

impl<K, T> fmt::Debug for Subscription<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}
