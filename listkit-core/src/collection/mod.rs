//! Sectioned collections and the types they are built from.

mod identity;
mod index_path;
mod permutation;
mod projection;
mod reactive;
mod section;

pub use identity::{Element, Identify};
pub use index_path::IndexPath;
pub use permutation::{apply_moves, move_pairs};
pub use projection::{project, AnyElement, AnyIdentity};
pub use reactive::{ReactiveCollection, WeakCollection};
pub use section::{Section, SectionKey};
