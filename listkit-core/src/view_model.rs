//! List view-model
//!
//! The owner of a collection on the presentation side. It binds the
//! collection to list views, tracks the current selection, and tears
//! everything down when the screen goes away.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::change::{ListAdapter, ListView};
use crate::collection::{Element, IndexPath, ReactiveCollection};
use crate::observe::{Relay, Subscription, SubscriptionBag};

/// A collection plus selection state.
pub struct ListViewModel<T: Element> {
    items_source: ReactiveCollection<T>,
    selected_item: Relay<Option<T>>,
    selected_index: Relay<Option<IndexPath>>,
    bag: Mutex<SubscriptionBag>,
}

impl<T: Element> ListViewModel<T> {
    pub fn new(items_source: ReactiveCollection<T>) -> Self {
        Self {
            items_source,
            selected_item: Relay::new(None),
            selected_index: Relay::new(None),
            bag: Mutex::new(SubscriptionBag::new()),
        }
    }

    pub fn items_source(&self) -> &ReactiveCollection<T> {
        &self.items_source
    }

    pub fn selected_item(&self) -> Relay<Option<T>> {
        self.selected_item.clone()
    }

    pub fn selected_index(&self) -> Relay<Option<IndexPath>> {
        self.selected_index.clone()
    }

    /// Bind `view` to the collection for as long as this view-model lives
    /// or until [`destroy`](Self::destroy).
    pub fn bind<V>(&self, view: &Arc<Mutex<V>>)
    where
        V: ListView + Send + 'static,
    {
        self.retain(ListAdapter::bind(&self.items_source, view));
    }

    /// Keep `subscription` alive until teardown.
    pub fn retain(&self, subscription: Subscription) {
        self.bag.lock().insert(subscription);
    }

    /// Number of subscriptions held until teardown.
    pub fn retained(&self) -> usize {
        self.bag.lock().len()
    }

    /// Select the element at `index_path`.
    ///
    /// Publishes the index first, then the element. A path that does not
    /// address an element leaves the selection untouched and returns `None`.
    pub fn select(&self, index_path: IndexPath) -> Option<T> {
        let Some(element) = self.items_source.get(index_path) else {
            tracing::debug!(%index_path, "selection out of range, ignored");
            return None;
        };
        self.selected_index.accept(Some(index_path));
        self.selected_item.accept(Some(element.clone()));
        Some(element)
    }

    /// Clear the selection, publishing `None` on both relays.
    pub fn deselect(&self) {
        self.selected_index.accept(None);
        self.selected_item.accept(None);
    }

    /// Tear down bindings, the collection and the selection relays.
    pub fn destroy(&self) {
        self.bag.lock().clear();
        self.items_source.destroy();
        self.selected_item.clear_subscribers();
        self.selected_index.clear_subscribers();
    }
}

impl<T: Element> Default for ListViewModel<T> {
    fn default() -> Self {
        Self::new(ReactiveCollection::new())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
