//! Change-Set Taxonomy
//!
//! A [`ChangeSet`] tells a list view what changed so it can animate just that
//! part instead of reloading everything. One is emitted per mutating call.
//!
//! # Section Indices
//!
//! Section indices are signed. [`ALL_SECTIONS`] (`-1`) addresses every
//! section the view currently shows; it is used by full deletes and reloads.
//!
//! # Wire Form
//!
//! Change-sets serialize as internally tagged JSON objects:
//!
//! ```json
//! { "kind": "delete_section", "section": -1, "animated": true }
//! ```
//!
//! A `kind` this version does not know decodes to [`ChangeSet::Unknown`],
//! which adapters answer with a full reload.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::collection::IndexPath;

/// Section index meaning "every section".
pub const ALL_SECTIONS: isize = -1;

/// Index paths carried by element changes. Most changes touch a few rows.
pub type IndexPaths = SmallVec<[IndexPath; 4]>;

/// What changed in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeSet {
    InsertSection {
        section: isize,
        animated: bool,
    },
    DeleteSection {
        section: isize,
        animated: bool,
    },
    /// Reload one section, or all of them with [`ALL_SECTIONS`].
    ModifySection {
        section: isize,
        animated: bool,
    },
    InsertElements {
        index_paths: IndexPaths,
        animated: bool,
    },
    DeleteElements {
        index_paths: IndexPaths,
        animated: bool,
    },
    /// Reload the given rows in place.
    ModifyElements {
        index_paths: IndexPaths,
        animated: bool,
    },
    /// Positionally paired moves: `from[i]` moves to `to[i]`.
    MoveElements {
        from: IndexPaths,
        to: IndexPaths,
        animated: bool,
    },
    /// A change kind produced by a newer version.
    #[serde(other)]
    Unknown,
}

/// Discriminant of a [`ChangeSet`], for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    InsertSection,
    DeleteSection,
    ModifySection,
    InsertElements,
    DeleteElements,
    ModifyElements,
    MoveElements,
    Unknown,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::InsertSection => "insert_section",
            ChangeKind::DeleteSection => "delete_section",
            ChangeKind::ModifySection => "modify_section",
            ChangeKind::InsertElements => "insert_elements",
            ChangeKind::DeleteElements => "delete_elements",
            ChangeKind::ModifyElements => "modify_elements",
            ChangeKind::MoveElements => "move_elements",
            ChangeKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl ChangeSet {
    pub fn insert_section(section: usize, animated: bool) -> Self {
        Self::InsertSection {
            section: section as isize,
            animated,
        }
    }

    pub fn delete_section(section: isize, animated: bool) -> Self {
        Self::DeleteSection { section, animated }
    }

    pub fn modify_section(section: isize, animated: bool) -> Self {
        Self::ModifySection { section, animated }
    }

    pub fn insert_elements(index_paths: impl IntoIterator<Item = IndexPath>, animated: bool) -> Self {
        Self::InsertElements {
            index_paths: index_paths.into_iter().collect(),
            animated,
        }
    }

    pub fn delete_elements(index_paths: impl IntoIterator<Item = IndexPath>, animated: bool) -> Self {
        Self::DeleteElements {
            index_paths: index_paths.into_iter().collect(),
            animated,
        }
    }

    pub fn modify_elements(index_paths: impl IntoIterator<Item = IndexPath>, animated: bool) -> Self {
        Self::ModifyElements {
            index_paths: index_paths.into_iter().collect(),
            animated,
        }
    }

    /// Build a move change from `(from, to)` pairs, keeping their order.
    pub fn move_elements(
        pairs: impl IntoIterator<Item = (IndexPath, IndexPath)>,
        animated: bool,
    ) -> Self {
        let (from, to) = pairs.into_iter().unzip();
        Self::MoveElements { from, to, animated }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeSet::InsertSection { .. } => ChangeKind::InsertSection,
            ChangeSet::DeleteSection { .. } => ChangeKind::DeleteSection,
            ChangeSet::ModifySection { .. } => ChangeKind::ModifySection,
            ChangeSet::InsertElements { .. } => ChangeKind::InsertElements,
            ChangeSet::DeleteElements { .. } => ChangeKind::DeleteElements,
            ChangeSet::ModifyElements { .. } => ChangeKind::ModifyElements,
            ChangeSet::MoveElements { .. } => ChangeKind::MoveElements,
            ChangeSet::Unknown => ChangeKind::Unknown,
        }
    }

    /// Whether the view should animate this change. `Unknown` never animates.
    pub fn animated(&self) -> bool {
        match self {
            ChangeSet::InsertSection { animated, .. }
            | ChangeSet::DeleteSection { animated, .. }
            | ChangeSet::ModifySection { animated, .. }
            | ChangeSet::InsertElements { animated, .. }
            | ChangeSet::DeleteElements { animated, .. }
            | ChangeSet::ModifyElements { animated, .. }
            | ChangeSet::MoveElements { animated, .. } => *animated,
            ChangeSet::Unknown => false,
        }
    }

    /// Parse a change-set from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
