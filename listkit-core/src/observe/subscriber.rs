//! Subscriber identity and subscription handles.
//!
//! Every callback registered on a relay or event stream gets a unique
//! [`SubscriberId`]. Registration returns a [`Subscription`] handle; dropping
//! the handle removes the callback, so an adapter that is torn down stops
//! receiving notifications as soon as its handles go away.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

type Detach = Box<dyn FnOnce(SubscriberId) + Send + Sync>;

/// Handle to a registered callback.
///
/// Dropping this handle unregisters the callback.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    id: SubscriberId,
    detach: Option<Detach>,
}

impl Subscription {
    pub(crate) fn new<F>(id: SubscriberId, detach: F) -> Self
    where
        F: FnOnce(SubscriberId) + Send + Sync + 'static,
    {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    /// The ID of the registered callback.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Unsubscribe now.
    pub fn dispose(mut self) {
        self.run_detach();
    }

    /// Keep the callback registered for the lifetime of its source.
    pub fn forget(mut self) {
        self.detach = None;
    }

    /// Add this subscription to a bag that owns its lifetime.
    pub fn dispose_with(self, bag: &mut SubscriptionBag) {
        bag.insert(self);
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// A group of subscriptions disposed together.
///
/// Owners keep one bag per binding and drop (or [`clear`](Self::clear)) it
/// on teardown.
#[derive(Debug, Default)]
pub struct SubscriptionBag {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Dispose every subscription in the bag.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}
