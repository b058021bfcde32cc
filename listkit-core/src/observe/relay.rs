//! Relays and Event Streams
//!
//! A [`Relay`] holds a current value and pushes every new value to its
//! subscribers. New subscribers receive the current value right away, so an
//! adapter that binds late still starts from the latest snapshot.
//!
//! An [`EventStream`] has no current value. It only forwards events emitted
//! after a subscriber registered; change-sets travel this way because
//! replaying an old delta to a new view would corrupt it.
//!
//! # Delivery
//!
//! Both types hand each callback invocation to their [`Dispatcher`]. The
//! subscriber table is copied out of its lock before any callback runs, so a
//! callback may subscribe, unsubscribe or read the source it is observing.
//!
//! # Thread Safety
//!
//! Values live behind `parking_lot` locks and callbacks must be
//! `Send + Sync`. Clones share state, like the signals they are modeled on.

use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::dispatch::{Dispatcher, ImmediateDispatcher};
use super::subscriber::{SubscriberId, Subscription};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Subscriber table in registration order.
struct Registry<T> {
    callbacks: RwLock<IndexMap<SubscriberId, Callback<T>>>,
}

impl<T: Send + Sync + 'static> Registry<T> {
    fn new() -> Self {
        Self {
            callbacks: RwLock::new(IndexMap::new()),
        }
    }

    fn insert(self: &Arc<Self>, callback: Callback<T>) -> (Subscription, Callback<T>) {
        let id = SubscriberId::new();
        self.callbacks.write().insert(id, callback.clone());
        tracing::trace!(subscriber = id.raw(), "subscribed");

        let weak: Weak<Self> = Arc::downgrade(self);
        let subscription = Subscription::new(id, move |id| {
            if let Some(registry) = weak.upgrade() {
                registry.remove(id);
            }
        });
        (subscription, callback)
    }

    fn remove(&self, id: SubscriberId) {
        if self.callbacks.write().shift_remove(&id).is_some() {
            tracing::trace!(subscriber = id.raw(), "unsubscribed");
        }
    }

    fn snapshot(&self) -> Vec<Callback<T>> {
        self.callbacks.read().values().cloned().collect()
    }

    fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    fn clear(&self) {
        self.callbacks.write().clear();
    }
}

/// Deliver `value` to `callbacks` through `dispatcher`.
fn broadcast<T>(dispatcher: &Arc<dyn Dispatcher>, callbacks: Vec<Callback<T>>, value: Arc<T>)
where
    T: Send + Sync + 'static,
{
    for callback in callbacks {
        let value = Arc::clone(&value);
        dispatcher.dispatch(Box::new(move || callback(&value)));
    }
}

/// A value that notifies subscribers whenever it is replaced.
///
/// # Example
///
/// ```rust
/// use listkit_core::observe::Relay;
///
/// let relay = Relay::new(1);
/// let _sub = relay.subscribe(|value| println!("now {}", value));
/// relay.accept(2);
/// assert_eq!(relay.get(), 2);
/// ```
pub struct Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    value: Arc<RwLock<T>>,
    registry: Arc<Registry<T>>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a relay that delivers inline.
    pub fn new(value: T) -> Self {
        Self::with_dispatcher(value, ImmediateDispatcher::shared())
    }

    /// Create a relay that delivers through `dispatcher`.
    pub fn with_dispatcher(value: T, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            registry: Arc::new(Registry::new()),
            dispatcher,
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.value.read())
    }

    /// Replace the value and notify every subscriber.
    pub fn accept(&self, value: T) {
        *self.value.write() = value.clone();
        broadcast(&self.dispatcher, self.registry.snapshot(), Arc::new(value));
    }

    /// Replace the value without notifying anyone. Later subscribers are
    /// replayed the new value.
    pub fn replace_silently(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.write(), value)
    }

    /// Register a callback. It is invoked with the current value first.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let (subscription, callback) = self.registry.insert(Arc::new(notify));
        broadcast(&self.dispatcher, vec![callback], Arc::new(self.get()));
        subscription
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// Drop every registered callback.
    pub fn clear_subscribers(&self) {
        self.registry.clear();
    }
}

impl<T> Clone for Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            registry: Arc::clone(&self.registry),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T> Debug for Relay<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("value", &*self.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// A stream of events without a current value.
pub struct EventStream<T>
where
    T: Send + Sync + 'static,
{
    registry: Arc<Registry<T>>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl<T> EventStream<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_dispatcher(ImmediateDispatcher::shared())
    }

    pub fn with_dispatcher(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            dispatcher,
        }
    }

    /// Push an event to the current subscribers.
    pub fn emit(&self, event: T) {
        broadcast(&self.dispatcher, self.registry.snapshot(), Arc::new(event));
    }

    /// Register a callback for events emitted from now on.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.registry.insert(Arc::new(notify)).0
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn clear_subscribers(&self) {
        self.registry.clear();
    }
}

impl<T: Send + Sync + 'static> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T: Send + Sync + 'static> Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::dispatch;
    use parking_lot::Mutex;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &T| sink.lock().push(value.clone()))
    }

    #[test]
    fn relay_get_and_accept() {
        let relay = Relay::new(0);
        assert_eq!(relay.get(), 0);

        relay.accept(42);
        assert_eq!(relay.get(), 42);
        assert_eq!(relay.with(|v| v + 1), 43);
    }

    #[test]
    fn relay_replays_current_value_then_updates() {
        let relay = Relay::new(1);
        let (seen, callback) = recorder();
        let _sub = relay.subscribe(callback);

        relay.accept(2);
        relay.accept(3);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let relay = Relay::new(0);
        let (seen, callback) = recorder();
        let sub = relay.subscribe(callback);
        assert_eq!(relay.subscriber_count(), 1);

        relay.accept(1);
        drop(sub);
        relay.accept(2);

        assert_eq!(*seen.lock(), vec![0, 1]);
        assert_eq!(relay.subscriber_count(), 0);
    }

    #[test]
    fn relay_clone_shares_state() {
        let relay1 = Relay::new(String::from("a"));
        let relay2 = relay1.clone();
        let _sub = relay2.subscribe(|_| {});

        relay1.accept("b".into());
        assert_eq!(relay2.get(), "b");
        assert_eq!(relay1.subscriber_count(), 1);
    }

    #[test]
    fn callbacks_may_read_the_source() {
        let relay = Relay::new(0);
        let inner = relay.clone();
        let (seen, sink) = recorder();
        let _sub = relay.subscribe(move |_| sink(&inner.get()));

        relay.accept(7);
        assert_eq!(*seen.lock(), vec![0, 7]);
    }

    #[test]
    fn silent_replace_skips_current_subscribers() {
        let relay = Relay::new(1);
        let (seen, callback) = recorder();
        let _sub = relay.subscribe(callback);

        assert_eq!(relay.replace_silently(9), 1);
        assert_eq!(*seen.lock(), vec![1]);

        let (late, callback) = recorder();
        let _late = relay.subscribe(callback);
        assert_eq!(*late.lock(), vec![9]);
    }

    #[test]
    fn event_stream_does_not_replay() {
        let stream = EventStream::new();
        stream.emit(1);

        let (seen, callback) = recorder();
        let _sub = stream.subscribe(callback);
        stream.emit(2);
        stream.emit(3);

        assert_eq!(*seen.lock(), vec![2, 3]);
    }

    #[test]
    fn event_stream_delivers_in_registration_order() {
        let stream = EventStream::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = order.clone();
        let _a = stream.subscribe(move |_: &()| first.lock().push("a"));
        let second = order.clone();
        let _b = stream.subscribe(move |_: &()| second.lock().push("b"));

        stream.emit(());
        assert_eq!(*order.lock(), vec!["a", "b"]);
    }

    #[test]
    fn clear_subscribers_detaches_everyone() {
        let stream: EventStream<u8> = EventStream::new();
        let sub = stream.subscribe(|_| {});
        stream.clear_subscribers();
        assert_eq!(stream.subscriber_count(), 0);
        // Disposing after a clear is harmless.
        sub.dispose();
    }

    #[test]
    fn queued_relay_delivers_on_drain() {
        let (dispatcher, mut queue) = dispatch::queue();
        let relay = Relay::with_dispatcher(0, Arc::new(dispatcher));
        let (seen, callback) = recorder();
        let _sub = relay.subscribe(callback);

        relay.accept(5);
        assert!(seen.lock().is_empty());

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(*seen.lock(), vec![0, 5]);
    }
}
