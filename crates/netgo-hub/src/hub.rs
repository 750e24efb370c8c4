//! The registry of pending waiters, keyed by whatever the waiters watch.
//!
//! # Architecture
//!
//! ```text
//!   waiter A ─┐                          ┌─→ slot A  (oneshot)
//!   waiter B ─┼─ subscribe(key) ──→ [ key → [A, B] ]
//!             │                          └─→ slot B  (oneshot)
//!   mutator ──── publish(key, snap) ──→ take [A, B] ──→ send snap to each
//! ```
//!
//! One `parking_lot::Mutex` guards the whole registry. It is only ever held
//! for map edits, never across an `.await` and never while sending: publish
//! and shutdown take the affected registrations out under the lock, release
//! it, and then deliver.
//!
//! # Guarantees
//!
//! - A publish reaches every registration that existed under its key when
//!   the publish took them, and nothing registered afterwards.
//! - A registration is delivered to at most once; taking it out of the map
//!   is the single point where it changes hands.
//! - After a wait resolves in any way, the registration is gone from the
//!   map, so the map size is bounded by the number of waits in progress.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::subscription::{Delivery, RegistrationId, RegistrationState, Subscription};
use crate::HubError;

/// One registration as the hub sees it: the sending half of its slot.
struct Waiter<T> {
    id: RegistrationId,
    slot: oneshot::Sender<Delivery<T>>,
    registered_at: Instant,
}

struct Registry<K, T> {
    closed: bool,
    waiters: HashMap<K, Vec<Waiter<T>>>,
}

/// State shared between the hub handle and its subscriptions.
///
/// Subscriptions hold a `Weak` to this so a leftover `Subscription` never
/// keeps a dropped hub alive.
pub(crate) struct Shared<K, T> {
    registry: Mutex<Registry<K, T>>,
    next_id: AtomicU64,
}

impl<K, T> Shared<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    /// Removes one registration. Returns `false` if it was already gone
    /// (delivered, shut down, or removed before).
    pub(crate) fn unsubscribe(&self, key: &K, id: RegistrationId) -> bool {
        let mut registry = self.registry.lock();
        let Some(list) = registry.waiters.get_mut(key) else {
            return false;
        };

        let before = list.len();
        list.retain(|w| w.id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            registry.waiters.remove(key);
        }
        removed
    }
}

/// Broadcasts snapshots to everyone waiting on a key.
///
/// Cloning is cheap; all clones share one registry.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use netgo_hub::{SubscriptionHub, WaitOutcome};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hub: SubscriptionHub<u64, &'static str> = SubscriptionHub::new();
/// let sub = hub.subscribe(7).unwrap();
///
/// hub.publish(&7, "moved").unwrap();
///
/// let outcome = sub.wait(Duration::from_secs(5), &CancellationToken::new()).await;
/// assert_eq!(outcome, WaitOutcome::Delivered("moved"));
/// assert_eq!(hub.total_pending(), 0);
/// # }
/// ```
pub struct SubscriptionHub<K, T> {
    shared: Arc<Shared<K, T>>,
}

impl<K, T> Clone for SubscriptionHub<K, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, T> Default for SubscriptionHub<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> SubscriptionHub<K, T>
where
    K: Eq + Hash + Clone + fmt::Debug,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry {
                    closed: false,
                    waiters: HashMap::new(),
                }),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Waiter side
    // -----------------------------------------------------------------------

    /// Registers interest in the next publish for `key`.
    ///
    /// The registration is visible to publishers as soon as this returns.
    /// Callers that need "a change after what I last saw" must subscribe
    /// *before* re-reading current state, then wait.
    ///
    /// # Errors
    /// [`HubError::Closed`] once [`shutdown_all`](Self::shutdown_all) has run.
    pub fn subscribe(&self, key: K) -> Result<Subscription<K, T>, HubError> {
        let (tx, rx) = oneshot::channel();
        let id = RegistrationId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let registered_at = Instant::now();

        {
            let mut registry = self.shared.registry.lock();
            if registry.closed {
                return Err(HubError::Closed);
            }
            registry.waiters.entry(key.clone()).or_default().push(Waiter {
                id,
                slot: tx,
                registered_at,
            });
        }

        tracing::trace!(?key, %id, "waiter registered");
        Ok(Subscription {
            key,
            id,
            registered_at,
            slot: rx,
            hub: Arc::downgrade(&self.shared),
            state: RegistrationState::Pending,
        })
    }

    /// Removes a registration by id. Idempotent.
    ///
    /// Waiters normally never call this: [`Subscription::wait`] and
    /// `Subscription`'s `Drop` do it for them.
    pub fn unsubscribe(&self, key: &K, id: RegistrationId) -> bool {
        self.shared.unsubscribe(key, id)
    }

    // -----------------------------------------------------------------------
    // Publisher side
    // -----------------------------------------------------------------------

    /// Delivers `snapshot` to every registration currently under `key` and
    /// removes them. Returns how many waiters received it.
    ///
    /// Waiters whose receiving half is already gone are skipped. Publishing
    /// to a key with no waiters is a no-op.
    ///
    /// # Errors
    /// [`HubError::Closed`] after shutdown. Callers that publish as a side
    /// effect of a committed mutation should log this and carry on.
    pub fn publish(&self, key: &K, snapshot: T) -> Result<usize, HubError> {
        let taken = {
            let mut registry = self.shared.registry.lock();
            if registry.closed {
                return Err(HubError::Closed);
            }
            registry.waiters.remove(key)
        };

        let Some(waiters) = taken else {
            tracing::trace!(?key, "publish with no waiters");
            return Ok(0);
        };

        let mut delivered = 0;
        for waiter in waiters {
            match waiter.slot.send(Delivery::Snapshot(snapshot.clone())) {
                Ok(()) => delivered += 1,
                Err(_) => tracing::trace!(
                    ?key,
                    id = %waiter.id,
                    "waiter left before delivery"
                ),
            }
        }

        tracing::debug!(?key, delivered, "snapshot published");
        Ok(delivered)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Closes the hub and wakes every pending waiter with a closed outcome.
    ///
    /// Later `subscribe` and `publish` calls fail with [`HubError::Closed`].
    /// Returns the number of waiters woken; a second call returns 0.
    pub fn shutdown_all(&self) -> usize {
        let drained = {
            let mut registry = self.shared.registry.lock();
            registry.closed = true;
            mem::take(&mut registry.waiters)
        };

        let mut woken = 0;
        let now = Instant::now();
        for (key, waiters) in drained {
            for waiter in waiters {
                tracing::trace!(
                    ?key,
                    id = %waiter.id,
                    waited_ms = now.duration_since(waiter.registered_at).as_millis() as u64,
                    "closing waiter"
                );
                if waiter.slot.send(Delivery::Closed).is_ok() {
                    woken += 1;
                }
            }
        }

        tracing::info!(woken, "subscription hub closed");
        woken
    }

    pub fn is_closed(&self) -> bool {
        self.shared.registry.lock().closed
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Registrations currently pending under `key`.
    pub fn pending(&self, key: &K) -> usize {
        self.shared
            .registry
            .lock()
            .waiters
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Registrations currently pending under any key.
    pub fn total_pending(&self) -> usize {
        self.shared.registry.lock().waiters.values().map(Vec::len).sum()
    }

    /// Keys with at least one pending registration.
    pub fn key_count(&self) -> usize {
        self.shared.registry.lock().waiters.len()
    }
}

impl<K, T> fmt::Debug for SubscriptionHub<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.shared.registry.lock();
        f.debug_struct("SubscriptionHub")
            .field("closed", &registry.closed)
            .field("keys", &registry.waiters.len())
            .finish()
    }
}
