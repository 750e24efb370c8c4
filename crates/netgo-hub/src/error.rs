//! Hub errors.

/// Errors from [`SubscriptionHub`](crate::SubscriptionHub) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// The hub has been shut down and accepts no new work.
    #[error("subscription hub is closed")]
    Closed,
}
