//! Error types for collection operations.
//!
//! Only contract violations become errors. The graceful fallbacks of the
//! insert/append/sort operations never produce one.

use std::fmt;

/// What an out-of-range index was addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget {
    /// A section index within the collection.
    Section,
    /// A row index, within the given section when known.
    Row { section: Option<usize> },
}

impl fmt::Display for IndexTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexTarget::Section => f.write_str("section"),
            IndexTarget::Row { section: Some(section) } => write!(f, "row of section {}", section),
            IndexTarget::Row { section: None } => f.write_str("row"),
        }
    }
}

/// Errors raised by sections, collections and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// Direct access or single-index removal beyond the current bounds.
    #[error("{target} index {index} out of range (len {len})")]
    IndexOutOfRange {
        target: IndexTarget,
        index: isize,
        len: usize,
    },

    /// The configuration document could not be parsed.
    #[error("invalid collection config: {0}")]
    Config(#[from] serde_json::Error),
}

impl CollectionError {
    pub(crate) fn section_out_of_range(index: isize, len: usize) -> Self {
        Self::IndexOutOfRange {
            target: IndexTarget::Section,
            index,
            len,
        }
    }

    pub(crate) fn row_out_of_range(section: Option<usize>, row: usize, len: usize) -> Self {
        Self::IndexOutOfRange {
            target: IndexTarget::Row { section },
            index: row as isize,
            len,
        }
    }

    /// Returns true for the `IndexOutOfRange` kind.
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CollectionError>;
