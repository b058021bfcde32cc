//! List Adapter
//!
//! Turns change-sets into calls on a platform list view.
//!
//! # How Adapters Work
//!
//! 1. The adapter subscribes to the collection's change-set stream.
//!
//! 2. For each change-set it validates the payload against the view's
//!    current layout (what it is about to remove or move away from) and the
//!    collection's current contents (what it is about to insert or reload).
//!
//! 3. Valid animated changes are applied as one batch between
//!    `begin_updates` and `end_updates`. Anything else, whether
//!    non-animated, unknown or out of bounds, becomes `reload_data`.
//!
//! # Teardown
//!
//! The adapter holds only weak references to the view and the collection.
//! Once either is gone, change-sets are discarded instead of touching a dead
//! view.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::change_set::ChangeSet;
use crate::collection::{Element, IndexPath, ReactiveCollection, WeakCollection};
use crate::observe::Subscription;

/// The operations a platform list view offers.
///
/// `number_of_sections` and `number_of_rows` report what the view currently
/// displays, before the change being applied.
pub trait ListView {
    fn number_of_sections(&self) -> usize;

    fn number_of_rows(&self, section: usize) -> usize;

    fn begin_updates(&mut self) {}

    fn end_updates(&mut self) {}

    fn insert_sections(&mut self, sections: &[usize]);

    fn delete_sections(&mut self, sections: &[usize]);

    fn reload_sections(&mut self, sections: &[usize]);

    fn insert_rows(&mut self, index_paths: &[IndexPath]);

    fn delete_rows(&mut self, index_paths: &[IndexPath]);

    fn reload_rows(&mut self, index_paths: &[IndexPath]);

    fn move_row(&mut self, from: IndexPath, to: IndexPath);

    /// Throw away the current layout and rebuild from the data source.
    fn reload_data(&mut self);
}

/// How a change-set ended up being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Applied as an incremental batch.
    Incremental,
    /// Non-animated, or nothing left to animate, so the view reloaded.
    Reloaded,
    /// Fell back to a reload: unknown kind or payload out of bounds.
    FellBack,
    /// View or collection no longer exists.
    Discarded,
}

/// Post-change bounds, read from the collection.
struct Bounds<'a, T: Element> {
    source: &'a ReactiveCollection<T>,
}

impl<T: Element> Bounds<'_, T> {
    fn in_source(&self, path: &IndexPath) -> bool {
        path.row < self.source.count_elements(path.section)
    }

    fn section_in_source(&self, section: usize) -> bool {
        section < self.source.count()
    }
}

fn in_view(view: &impl ListView, path: &IndexPath) -> bool {
    path.section < view.number_of_sections() && path.row < view.number_of_rows(path.section)
}

/// Apply one change-set to `view`, using `source` for post-change bounds.
pub fn apply_change_set<T, V>(view: &mut V, change: &ChangeSet, source: &ReactiveCollection<T>) -> Applied
where
    T: Element,
    V: ListView,
{
    if let ChangeSet::Unknown = change {
        tracing::warn!("unknown change kind, reloading");
        view.reload_data();
        return Applied::FellBack;
    }
    if !change.animated() {
        view.reload_data();
        return Applied::Reloaded;
    }

    let bounds = Bounds { source };
    let Some(plan) = plan(view, change, &bounds) else {
        tracing::warn!(kind = %change.kind(), "change out of bounds, reloading");
        view.reload_data();
        return Applied::FellBack;
    };

    if let Plan::ReloadData = plan {
        view.reload_data();
        return Applied::Reloaded;
    }

    view.begin_updates();
    match plan {
        Plan::InsertSections(sections) => view.insert_sections(&sections),
        Plan::DeleteSections(sections) => view.delete_sections(&sections),
        Plan::ReloadSections(sections) => view.reload_sections(&sections),
        Plan::InsertRows(paths) => view.insert_rows(paths),
        Plan::DeleteRows(paths) => view.delete_rows(paths),
        Plan::ReloadRows(paths) => view.reload_rows(paths),
        Plan::Moves(from, to) => {
            for (from, to) in from.iter().zip(to) {
                view.move_row(*from, *to);
            }
        }
        Plan::ReloadData => {}
    }
    view.end_updates();
    Applied::Incremental
}

/// A validated view update.
enum Plan<'a> {
    InsertSections(Vec<usize>),
    DeleteSections(Vec<usize>),
    ReloadSections(Vec<usize>),
    InsertRows(&'a [IndexPath]),
    DeleteRows(&'a [IndexPath]),
    ReloadRows(&'a [IndexPath]),
    Moves(&'a [IndexPath], &'a [IndexPath]),
    ReloadData,
}

/// Validate `change` and decide the view calls. `None` means out of bounds.
fn plan<'a, T: Element, V: ListView>(
    view: &V,
    change: &'a ChangeSet,
    bounds: &Bounds<'_, T>,
) -> Option<Plan<'a>> {
    let view_sections = view.number_of_sections();
    let plan = match change {
        ChangeSet::InsertSection { section, .. } => {
            let section = usize::try_from(*section).ok()?;
            if section > view_sections || !bounds.section_in_source(section) {
                return None;
            }
            Plan::InsertSections(vec![section])
        }
        // Range computed now, from what the view shows.
        ChangeSet::DeleteSection { section, .. } if *section < 0 => {
            if view_sections == 0 {
                Plan::ReloadData
            } else {
                Plan::DeleteSections((0..view_sections).collect())
            }
        }
        ChangeSet::DeleteSection { section, .. } => {
            let section = *section as usize;
            if section >= view_sections {
                return None;
            }
            Plan::DeleteSections(vec![section])
        }
        // Resets can change the section count, so all-section reloads
        // always rebuild the whole view.
        ChangeSet::ModifySection { section, .. } if *section < 0 => Plan::ReloadData,
        ChangeSet::ModifySection { section, .. } => {
            let section = *section as usize;
            if section >= view_sections || !bounds.section_in_source(section) {
                return None;
            }
            Plan::ReloadSections(vec![section])
        }
        ChangeSet::InsertElements { index_paths, .. } => {
            if !index_paths.iter().all(|path| bounds.in_source(path)) {
                return None;
            }
            Plan::InsertRows(index_paths.as_slice())
        }
        ChangeSet::DeleteElements { index_paths, .. } => {
            if !index_paths.iter().all(|path| in_view(view, path)) {
                return None;
            }
            Plan::DeleteRows(index_paths.as_slice())
        }
        ChangeSet::ModifyElements { index_paths, .. } => {
            if !index_paths
                .iter()
                .all(|path| in_view(view, path) && bounds.in_source(path))
            {
                return None;
            }
            Plan::ReloadRows(index_paths.as_slice())
        }
        ChangeSet::MoveElements { from, to, .. } => {
            if from.len() != to.len()
                || !from.iter().all(|path| in_view(view, path))
                || !to.iter().all(|path| bounds.in_source(path))
            {
                return None;
            }
            Plan::Moves(from.as_slice(), to.as_slice())
        }
        ChangeSet::Unknown => return None,
    };
    Some(plan)
}

/// Binds a collection to a list view.
///
/// Besides applying change-sets, the adapter answers the view's data-source
/// questions (section count, row count, element for a cell) without ever
/// panicking on a stale index path.
pub struct ListAdapter<T: Element, V: ListView> {
    source: WeakCollection<T>,
    view: Weak<Mutex<V>>,
}

impl<T, V> ListAdapter<T, V>
where
    T: Element,
    V: ListView + Send + 'static,
{
    pub fn new(source: &ReactiveCollection<T>, view: &Arc<Mutex<V>>) -> Self {
        Self {
            source: source.downgrade(),
            view: Arc::downgrade(view),
        }
    }

    /// Subscribe to `source`'s change-sets. Dropping the returned handle
    /// unbinds the view.
    pub fn bind(source: &ReactiveCollection<T>, view: &Arc<Mutex<V>>) -> Subscription {
        let adapter = Self::new(source, view);
        source.changes().subscribe(move |change| {
            adapter.apply(change);
        })
    }

    /// Apply one change-set to the bound view.
    pub fn apply(&self, change: &ChangeSet) -> Applied {
        let (Some(view), Some(source)) = (self.view.upgrade(), self.source.upgrade()) else {
            tracing::debug!(kind = %change.kind(), "adapter target gone, discarding change");
            return Applied::Discarded;
        };
        let mut view = view.lock();
        apply_change_set(&mut *view, change, &source)
    }

    // ------------------------------------------------------------------
    // Data source
    // ------------------------------------------------------------------

    pub fn number_of_sections(&self) -> usize {
        self.source.upgrade().map_or(0, |source| source.count())
    }

    pub fn number_of_rows(&self, section: usize) -> usize {
        self.source
            .upgrade()
            .map_or(0, |source| source.count_elements(section))
    }

    /// Element to bind into the cell at `index_path`, if it still exists.
    pub fn element_for(&self, index_path: IndexPath) -> Option<T> {
        self.source.upgrade()?.get(index_path)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
