//! Move computation for reordered sections.
//!
//! After a section is sorted, each element's old row is paired with its new
//! row by matching identities. Among rows sharing an identity, a row whose
//! content is equal wins; otherwise the earliest remaining row is taken. So
//! duplicates still yield a one-to-one pairing, and two rows with the same
//! identity but different content are reported as moved when they swap.

use std::collections::HashMap;

use super::identity::Identify;

/// Pair every old row with the row its element now occupies.
///
/// Elements whose identity does not appear in `new` are left out, so a
/// result shorter than `old` means the two orders are not a permutation of
/// each other.
pub fn move_pairs<T: Identify>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    let mut positions: HashMap<T::Id, Vec<usize>> = HashMap::with_capacity(new.len());
    for (row, element) in new.iter().enumerate() {
        positions.entry(element.identity()).or_default().push(row);
    }

    old.iter()
        .enumerate()
        .filter_map(|(from, element)| {
            let candidates = positions.get_mut(&element.identity())?;
            if candidates.is_empty() {
                return None;
            }
            let slot = candidates
                .iter()
                .position(|&row| new[row] == *element)
                .unwrap_or(0);
            Some((from, candidates.remove(slot)))
        })
        .collect()
}

/// Replay `(from, to)` pairs against `old`, as a list view would.
///
/// Rows not named in any pair stay where they were.
pub fn apply_moves<T: Clone>(old: &[T], pairs: &[(usize, usize)]) -> Vec<T> {
    let mut result = old.to_vec();
    for &(from, to) in pairs {
        if let (Some(element), Some(slot)) = (old.get(from), result.get_mut(to)) {
            *slot = element.clone();
        }
    }
    result
}
