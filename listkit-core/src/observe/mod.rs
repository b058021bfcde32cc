//! Observation Primitives
//!
//! The collection publishes its state through the types in this module:
//!
//! - [`Relay`]: a current value plus change notifications (snapshots).
//! - [`EventStream`]: value-less events (change-sets).
//! - [`Subscription`] / [`SubscriptionBag`]: handles that unsubscribe on drop.
//! - [`Dispatcher`]: where callbacks run, injected by the owner.
//!
//! Delivery is push-based. With the default [`ImmediateDispatcher`], every
//! observer has run by the time the publishing call returns.

mod dispatch;
mod relay;
mod subscriber;

pub use dispatch::{queue, DispatchQueue, Dispatcher, ImmediateDispatcher, Job, QueueDispatcher};
pub use relay::{EventStream, Relay};
pub use subscriber::{SubscriberId, Subscription, SubscriptionBag};
