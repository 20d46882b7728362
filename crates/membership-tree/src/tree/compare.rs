//! Sibling ordering used when enumerating children

use std::cmp::Ordering;

use crate::tree::{DirectoryEntry, NodeKind};

/// Total order over siblings: groups first, then leaves.
///
/// Groups sort by name descending because they are pushed onto a LIFO stack
/// and therefore pop (and print) in ascending order. Leaves are emitted as a
/// block in iteration order, so they sort ascending.
pub fn compare_entries<E: DirectoryEntry + ?Sized>(lhs: &E, rhs: &E) -> Ordering {
    match (lhs.kind(), rhs.kind()) {
        (NodeKind::Expandable, NodeKind::Leaf) => Ordering::Less,
        (NodeKind::Leaf, NodeKind::Expandable) => Ordering::Greater,
        (NodeKind::Expandable, NodeKind::Expandable) => compare_names(rhs.name(), lhs.name()),
        (NodeKind::Leaf, NodeKind::Leaf) => compare_names(lhs.name(), rhs.name()),
    }
}

/// Sort siblings in enumeration order
pub fn sort_entries<E: DirectoryEntry>(entries: &mut [E]) {
    entries.sort_by(|a, b| compare_entries(a, b));
}

/// Case-insensitive comparison with an ordinal tie-break
fn compare_names(lhs: &str, rhs: &str) -> Ordering {
    lhs.chars()
        .flat_map(char::to_lowercase)
        .cmp(rhs.chars().flat_map(char::to_lowercase))
        .then_with(|| lhs.cmp(rhs))
}
