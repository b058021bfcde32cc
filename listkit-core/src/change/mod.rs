//! Change-sets and the adapter that applies them to list views.

mod adapter;
mod change_set;

pub use adapter::{apply_change_set, Applied, ListAdapter, ListView};
pub use change_set::{ChangeKind, ChangeSet, IndexPaths, ALL_SECTIONS};
