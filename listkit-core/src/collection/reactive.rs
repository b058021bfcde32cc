//! Reactive Collection
//!
//! An ordered list of [`Section`]s that publishes its state after every
//! mutating call.
//!
//! # What Gets Published
//!
//! After a successful mutation, in this order:
//!
//! 1. the raw snapshot on [`sources`](ReactiveCollection::sources),
//! 2. the type-erased snapshot on
//!    [`projected_sources`](ReactiveCollection::projected_sources),
//! 3. a [`ChangeSet`] on [`changes`](ReactiveCollection::changes).
//!
//! The write lock is released before any observer runs, so observers may
//! read the collection. Mutating it from inside an observer is not
//! supported.
//!
//! # Boundary Policies
//!
//! Direct lookups, single-element removal and section removal fail with
//! `IndexOutOfRange`. Insert and append instead degrade gracefully, and
//! existing callers rely on that:
//!
//! - a section index at or past the end appends a new unnamed section;
//! - an empty target section takes the elements by appending;
//! - a row at or past the end of a non-empty section drops the call.
//!
//! Sorting emits moves only when every element could be matched by
//! identity; otherwise nothing is published.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::identity::Element;
use super::index_path::IndexPath;
use super::permutation::move_pairs;
use super::projection::{project, AnyElement};
use super::section::{Section, SectionKey};
use crate::change::{ChangeSet, ALL_SECTIONS};
use crate::config::CollectionConfig;
use crate::error::{CollectionError, Result};
use crate::observe::{Dispatcher, EventStream, ImmediateDispatcher, Relay};

/// What a mutation asks to publish.
enum Emit {
    Nothing,
    Snapshot,
    Change(ChangeSet),
}

struct Inner<T: Element> {
    sections: RwLock<Vec<Section<T>>>,
    config: CollectionConfig,
    sources: Relay<Vec<Section<T>>>,
    projected: Relay<Vec<Section<AnyElement>>>,
    changes: EventStream<ChangeSet>,
}

/// An observable, sectioned collection.
///
/// Clones are handles to the same collection.
///
/// # Example
///
/// ```rust
/// use listkit_core::collection::{ReactiveCollection, Section};
///
/// let items = ReactiveCollection::new();
/// items.append_section(Section::new("A", vec!["x1", "x2"]), None);
/// items.insert_one("x3", 0, 0, None);
///
/// assert_eq!(items.remove(1, 0, None).unwrap(), "x1");
/// assert_eq!(items.section(0).unwrap().items(), &["x3", "x2"]);
/// ```
pub struct ReactiveCollection<T: Element> {
    inner: Arc<Inner<T>>,
}

/// Non-owning handle to a collection.
pub struct WeakCollection<T: Element> {
    inner: Weak<Inner<T>>,
}

impl<T: Element> WeakCollection<T> {
    pub fn upgrade(&self) -> Option<ReactiveCollection<T>> {
        self.inner.upgrade().map(|inner| ReactiveCollection { inner })
    }
}

impl<T: Element> Clone for WeakCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Element> ReactiveCollection<T> {
    /// Create an empty collection with default settings.
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    pub fn with_config(config: CollectionConfig) -> Self {
        Self::with_dispatcher(config, ImmediateDispatcher::shared())
    }

    /// Create an empty collection whose observers run on `dispatcher`.
    pub fn with_dispatcher(config: CollectionConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                sections: RwLock::new(Vec::new()),
                config,
                sources: Relay::with_dispatcher(Vec::new(), Arc::clone(&dispatcher)),
                projected: Relay::with_dispatcher(Vec::new(), Arc::clone(&dispatcher)),
                changes: EventStream::with_dispatcher(dispatcher),
            }),
        }
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakCollection<T> {
        WeakCollection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// The raw snapshot, re-published after every mutation.
    pub fn sources(&self) -> Relay<Vec<Section<T>>> {
        self.inner.sources.clone()
    }

    /// The snapshot with every element boxed as an [`AnyElement`].
    pub fn projected_sources(&self) -> Relay<Vec<Section<AnyElement>>> {
        self.inner.projected.clone()
    }

    /// One change-set per successful mutation.
    pub fn changes(&self) -> EventStream<ChangeSet> {
        self.inner.changes.clone()
    }

    /// Detach every observer and drop all content without publishing.
    ///
    /// Called by the owner on teardown. The collection stays usable, but
    /// nobody is listening any more. Observers attached afterwards start
    /// from the empty snapshot.
    pub fn destroy(&self) {
        self.inner.sources.clear_subscribers();
        self.inner.projected.clear_subscribers();
        self.inner.changes.clear_subscribers();
        self.inner.sections.write().clear();
        self.inner.sources.replace_silently(Vec::new());
        self.inner.projected.replace_silently(Vec::new());
        tracing::debug!("collection destroyed");
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Number of sections.
    pub fn count(&self) -> usize {
        self.inner.sections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sections.read().is_empty()
    }

    /// Number of elements in `section`, or 0 when there is no such section.
    pub fn count_elements(&self, section: usize) -> usize {
        self.inner
            .sections
            .read()
            .get(section)
            .map_or(0, Section::len)
    }

    /// Element at `index_path`.
    pub fn element(&self, index_path: IndexPath) -> Result<T> {
        self.element_at(index_path.section, index_path.row)
    }

    pub fn element_at(&self, section: usize, row: usize) -> Result<T> {
        let sections = self.inner.sections.read();
        let target = checked_section(sections.as_slice(), section)?;
        target
            .get(row)
            .cloned()
            .ok_or_else(|| CollectionError::row_out_of_range(Some(section), row, target.len()))
    }

    /// Element at `index_path`, or `None` when out of range.
    pub fn get(&self, index_path: IndexPath) -> Option<T> {
        self.inner
            .sections
            .read()
            .get(index_path.section)
            .and_then(|section| section.get(index_path.row))
            .cloned()
    }

    pub fn section(&self, index: usize) -> Result<Section<T>> {
        let sections = self.inner.sections.read();
        checked_section(sections.as_slice(), index).cloned()
    }

    /// Index of the first section whose key equals `key`.
    pub fn index_for_section(&self, key: &SectionKey) -> Option<usize> {
        self.inner
            .sections
            .read()
            .iter()
            .position(|section| section.key() == key)
    }

    /// Position of `element` in `section`; `None` if either is missing.
    pub fn first_index_of(&self, element: &T, section: usize) -> Option<usize> {
        self.with_section(section, |s| s.first_index_of(element))
    }

    pub fn last_index_of(&self, element: &T, section: usize) -> Option<usize> {
        self.with_section(section, |s| s.last_index_of(element))
    }

    pub fn first_index_where(&self, predicate: impl FnMut(&T) -> bool, section: usize) -> Option<usize> {
        self.with_section(section, |s| s.position(predicate))
    }

    pub fn last_index_where(&self, predicate: impl FnMut(&T) -> bool, section: usize) -> Option<usize> {
        self.with_section(section, |s| s.rposition(predicate))
    }

    /// Clone of the current sections.
    pub fn snapshot(&self) -> Vec<Section<T>> {
        self.inner.sections.read().clone()
    }

    /// Borrow the sections without cloning them.
    pub fn with_sections<R>(&self, f: impl FnOnce(&[Section<T>]) -> R) -> R {
        f(self.inner.sections.read().as_slice())
    }

    fn with_section<R>(&self, section: usize, f: impl FnOnce(&Section<T>) -> Option<R>) -> Option<R> {
        self.inner.sections.read().get(section).and_then(f)
    }

    // ------------------------------------------------------------------
    // Section manipulation
    // ------------------------------------------------------------------

    /// Replace all content with `sections`.
    pub fn reset(&self, sections: Vec<Section<T>>, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("reset", |current| {
            *current = sections;
            ((), Emit::Change(ChangeSet::modify_section(ALL_SECTIONS, animated)))
        });
    }

    /// Replace all content with one unnamed section per row list.
    pub fn reset_rows(&self, rows: Vec<Vec<T>>, animated: Option<bool>) {
        let sections = rows
            .into_iter()
            .map(|items| Section::new(SectionKey::default(), items))
            .collect();
        self.reset(sections, animated);
    }

    /// Replace the elements of one existing section. Ignored if the section
    /// does not exist.
    pub fn reset_section(&self, elements: Vec<T>, section: usize, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("reset_section", |current| match current.get_mut(section) {
            Some(target) => {
                target.replace_items(elements);
                ((), Emit::Change(ChangeSet::modify_section(section as isize, animated)))
            }
            None => {
                tracing::debug!(section, sections = current.len(), "reset_section ignored: no such section");
                ((), Emit::Nothing)
            }
        });
    }

    /// Re-publish without changing anything. A negative section means all.
    ///
    /// Ignored when the collection is empty or the section does not exist.
    pub fn reload(&self, section: isize, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("reload", |current| {
            if !current.is_empty() && section < current.len() as isize {
                let section = if section < 0 { ALL_SECTIONS } else { section };
                ((), Emit::Change(ChangeSet::modify_section(section, animated)))
            } else {
                tracing::debug!(section, sections = current.len(), "reload ignored");
                ((), Emit::Nothing)
            }
        });
    }

    /// Insert a section before `index`.
    ///
    /// Into an empty collection the section is always appended, whatever
    /// `index` says. Otherwise `index > count` fails and nothing changes.
    pub fn insert_section(&self, section: Section<T>, index: usize, animated: Option<bool>) -> Result<()> {
        let animated = self.animated(animated);
        self.edit("insert_section", |current| {
            if current.is_empty() {
                current.push(section);
                return (Ok(()), Emit::Change(ChangeSet::insert_section(0, animated)));
            }
            if index > current.len() {
                let err = CollectionError::section_out_of_range(index as isize, current.len());
                return (Err(err), Emit::Nothing);
            }
            current.insert(index, section);
            (Ok(()), Emit::Change(ChangeSet::insert_section(index, animated)))
        })
    }

    pub fn append_section(&self, section: Section<T>, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("append_section", |current| {
            current.push(section);
            let index = current.len() - 1;
            ((), Emit::Change(ChangeSet::insert_section(index, animated)))
        });
    }

    /// Append each section in turn, publishing once per section.
    pub fn append_sections(&self, sections: impl IntoIterator<Item = Section<T>>, animated: Option<bool>) {
        for section in sections {
            self.append_section(section, animated);
        }
    }

    /// Remove and return the section at `index`.
    ///
    /// Negative or past-the-end indices fail and leave the collection
    /// unchanged.
    pub fn remove_section(&self, index: isize, animated: Option<bool>) -> Result<Section<T>> {
        let animated = self.animated(animated);
        self.edit("remove_section", |current| {
            if index < 0 || index as usize >= current.len() {
                let err = CollectionError::section_out_of_range(index, current.len());
                return (Err(err), Emit::Nothing);
            }
            let removed = current.remove(index as usize);
            (Ok(removed), Emit::Change(ChangeSet::delete_section(index, animated)))
        })
    }

    /// Remove every section. Calling it on an empty collection is fine.
    pub fn remove_all(&self, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("remove_all", |current| {
            current.clear();
            ((), Emit::Change(ChangeSet::delete_section(ALL_SECTIONS, animated)))
        });
    }

    // ------------------------------------------------------------------
    // Element manipulation
    // ------------------------------------------------------------------

    /// Insert `elements` before `row` of `section`.
    ///
    /// See the module docs for the fallbacks: a missing section becomes a
    /// new appended section, an empty section is appended to, and a row at
    /// or past the end of a non-empty section drops the call.
    pub fn insert(&self, elements: Vec<T>, row: usize, section: usize, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("insert", |current| {
            if section >= current.len() {
                tracing::debug!(section, sections = current.len(), "insert past last section, appending a new one");
                current.push(Section::new(SectionKey::default(), elements));
                let index = current.len() - 1;
                return ((), Emit::Change(ChangeSet::insert_section(index, animated)));
            }

            let target = &mut current[section];
            let count = elements.len();
            let start = if target.is_empty() {
                target.extend(elements);
                0
            } else if row < target.len() && target.insert_all(elements, row).is_ok() {
                row
            } else {
                tracing::debug!(section, row, len = target.len(), "insert past last row ignored");
                return ((), Emit::Nothing);
            };

            if count == 0 {
                return ((), Emit::Nothing);
            }
            let paths = (start..start + count).map(|row| IndexPath::new(section, row));
            ((), Emit::Change(ChangeSet::insert_elements(paths, animated)))
        });
    }

    pub fn insert_one(&self, element: T, row: usize, section: usize, animated: Option<bool>) {
        self.insert(vec![element], row, section, animated);
    }

    pub fn insert_at(&self, elements: Vec<T>, index_path: IndexPath, animated: Option<bool>) {
        self.insert(elements, index_path.row, index_path.section, animated);
    }

    /// Append `elements` to `section`; a missing section becomes a new
    /// appended section.
    pub fn append(&self, elements: Vec<T>, section: usize, animated: Option<bool>) {
        let animated = self.animated(animated);
        self.edit("append", |current| {
            if section >= current.len() {
                tracing::debug!(section, sections = current.len(), "append past last section, appending a new one");
                current.push(Section::new(SectionKey::default(), elements));
                let index = current.len() - 1;
                return ((), Emit::Change(ChangeSet::insert_section(index, animated)));
            }

            let target = &mut current[section];
            let start = target.len();
            let count = elements.len();
            target.extend(elements);
            if count == 0 {
                return ((), Emit::Nothing);
            }
            let paths = (start..start + count).map(|row| IndexPath::new(section, row));
            ((), Emit::Change(ChangeSet::insert_elements(paths, animated)))
        });
    }

    pub fn append_one(&self, element: T, section: usize, animated: Option<bool>) {
        self.append(vec![element], section, animated);
    }

    /// Swap the element at `(section, row)` and return the old one.
    pub fn replace(&self, element: T, row: usize, section: usize, animated: Option<bool>) -> Result<T> {
        let animated = self.animated(animated);
        self.edit("replace", |current| {
            let outcome = checked_section_mut(current, section).and_then(|target| {
                target
                    .replace(row, element)
                    .map_err(|_| CollectionError::row_out_of_range(Some(section), row, target.len()))
            });
            match outcome {
                Ok(old) => {
                    let change = ChangeSet::modify_elements([IndexPath::new(section, row)], animated);
                    (Ok(old), Emit::Change(change))
                }
                Err(err) => (Err(err), Emit::Nothing),
            }
        })
    }

    /// Remove and return the element at `(section, row)`.
    pub fn remove(&self, row: usize, section: usize, animated: Option<bool>) -> Result<T> {
        let animated = self.animated(animated);
        self.edit("remove", |current| {
            let outcome = checked_section_mut(current, section).and_then(|target| {
                let len = target.len();
                target
                    .remove(row)
                    .map_err(|_| CollectionError::row_out_of_range(Some(section), row, len))
            });
            match outcome {
                Ok(removed) => {
                    let change = ChangeSet::delete_elements([IndexPath::new(section, row)], animated);
                    (Ok(removed), Emit::Change(change))
                }
                Err(err) => (Err(err), Emit::Nothing),
            }
        })
    }

    pub fn remove_at(&self, index_path: IndexPath, animated: Option<bool>) -> Result<T> {
        self.remove(index_path.row, index_path.section, animated)
    }

    /// Remove several rows of one section. See [`remove_paths`](Self::remove_paths).
    pub fn remove_rows(&self, rows: &[usize], section: usize, animated: Option<bool>) -> Vec<T> {
        let paths: Vec<IndexPath> = rows.iter().map(|&row| IndexPath::new(section, row)).collect();
        self.remove_paths(&paths, animated)
    }

    /// Remove the elements at `index_paths`.
    ///
    /// Paths refer to positions before the call. Missing and duplicate
    /// paths are skipped. Removed elements come back in request order.
    pub fn remove_paths(&self, index_paths: &[IndexPath], animated: Option<bool>) -> Vec<T> {
        let animated = self.animated(animated);
        self.edit("remove_paths", |current| {
            let mut seen = HashSet::with_capacity(index_paths.len());
            let valid: Vec<IndexPath> = index_paths
                .iter()
                .copied()
                .filter(|path| {
                    current
                        .get(path.section)
                        .is_some_and(|section| path.row < section.len())
                        && seen.insert(*path)
                })
                .collect();

            if valid.is_empty() {
                return (Vec::new(), Emit::Nothing);
            }

            let mut descending = valid.clone();
            descending.sort_unstable_by(|a, b| b.cmp(a));
            let mut taken = HashMap::with_capacity(descending.len());
            for path in descending {
                if let Ok(element) = current[path.section].remove(path.row) {
                    taken.insert(path, element);
                }
            }

            let removed = valid.iter().filter_map(|path| taken.remove(path)).collect();
            (removed, Emit::Change(ChangeSet::delete_elements(valid, animated)))
        })
    }

    /// Stable-sort one section and publish the resulting row moves.
    ///
    /// Only rows that actually moved are reported. When the old and new
    /// orders cannot be matched one-to-one by identity, the section stays
    /// sorted but nothing is published.
    pub fn sort_by<F>(&self, compare: F, section: usize, animated: Option<bool>) -> Result<()>
    where
        F: FnMut(&T, &T) -> std::cmp::Ordering,
    {
        let animated = self.animated(animated);
        self.edit("sort", |current| {
            let target = match checked_section_mut(current, section) {
                Ok(target) => target,
                Err(err) => return (Err(err), Emit::Nothing),
            };

            let old = target.items().to_vec();
            target.sort_by(compare);
            let pairs = move_pairs(&old, target.items());

            if pairs.len() != old.len() {
                tracing::debug!(section, matched = pairs.len(), expected = old.len(), "sort moves unmatched, not publishing");
                return (Ok(()), Emit::Nothing);
            }

            let moves: Vec<(IndexPath, IndexPath)> = pairs
                .into_iter()
                .filter(|(from, to)| from != to)
                .map(|(from, to)| (IndexPath::new(section, from), IndexPath::new(section, to)))
                .collect();
            if moves.is_empty() {
                return (Ok(()), Emit::Snapshot);
            }
            (Ok(()), Emit::Change(ChangeSet::move_elements(moves, animated)))
        })
    }

    // ------------------------------------------------------------------
    // Publication
    // ------------------------------------------------------------------

    fn animated(&self, animated: Option<bool>) -> bool {
        self.inner.config.resolve_animated(animated)
    }

    /// Run `f` under the write lock, then publish what it asked for.
    fn edit<R>(&self, op: &'static str, f: impl FnOnce(&mut Vec<Section<T>>) -> (R, Emit)) -> R {
        let (result, emit, snapshot) = {
            let mut sections = self.inner.sections.write();
            let (result, emit) = f(&mut *sections);
            let snapshot = match emit {
                Emit::Nothing => None,
                Emit::Snapshot | Emit::Change(_) => Some(sections.clone()),
            };
            (result, emit, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.publish(op, snapshot, emit);
        }
        result
    }

    fn publish(&self, op: &'static str, snapshot: Vec<Section<T>>, emit: Emit) {
        let change = match emit {
            Emit::Change(change) => Some(change),
            Emit::Nothing | Emit::Snapshot => None,
        };
        tracing::debug!(
            op,
            sections = snapshot.len(),
            change = %change.as_ref().map_or_else(|| "none".to_string(), |c| c.kind().to_string()),
            "collection updated"
        );

        let projection = self.inner.config.project_elements.then(|| project(&snapshot));
        self.inner.sources.accept(snapshot);
        if let Some(projection) = projection {
            self.inner.projected.accept(projection);
        }
        if let Some(change) = change {
            self.inner.changes.emit(change);
        }
    }
}

fn checked_section<T>(sections: &[Section<T>], index: usize) -> Result<&Section<T>> {
    sections
        .get(index)
        .ok_or_else(|| CollectionError::section_out_of_range(index as isize, sections.len()))
}

fn checked_section_mut<T>(sections: &mut [Section<T>], index: usize) -> Result<&mut Section<T>> {
    let len = sections.len();
    sections
        .get_mut(index)
        .ok_or_else(|| CollectionError::section_out_of_range(index as isize, len))
}

impl<T: Element> Default for ReactiveCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> Clone for ReactiveCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Element + fmt::Debug> fmt::Debug for ReactiveCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCollection")
            .field("sections", &*self.inner.sections.read())
            .field("config", &self.inner.config)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
