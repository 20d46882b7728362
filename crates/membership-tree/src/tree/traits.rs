//! Data-provider traits the traversal runs against

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::tree::{NodeKind, ObjectClass, ProviderError};

/// Which edge of the membership graph is followed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Group → its members
    #[default]
    #[display(fmt = "members")]
    Members,
    /// Principal → the groups it belongs to
    #[display(fmt = "member-of")]
    MemberOf,
}

/// A live handle to one entry of the directory
///
/// Handles are owned values: dropping a handle releases whatever the
/// provider holds for it (connections, search results, ...).
pub trait DirectoryEntry {
    /// Stable identifier of the entry (e.g. its distinguished name)
    fn key(&self) -> &str;

    /// Display name used for labels, ordering and exclusion
    fn name(&self) -> &str;

    /// Structural object class of the entry
    fn object_class(&self) -> ObjectClass;

    /// Whether the entry can be expanded
    fn kind(&self) -> NodeKind {
        self.object_class().node_kind()
    }
}

/// A source of directory entries and membership edges
///
/// Implementations only have to resolve identities and enumerate one level
/// of children; caching, cycle detection and rendering are handled by
/// [`TreeTraversal`](crate::tree::TreeTraversal).
///
/// # Example
///
/// ```ignore
/// impl Directory for MyLdap {
///     type Entry = LdapEntry;
///
///     fn find(&self, identity: &str) -> Result<LdapEntry, ProviderError> {
///         self.search_one(identity)
///     }
///
///     fn children(&self, entry: &LdapEntry, direction: Direction) -> Result<Vec<LdapEntry>, ProviderError> {
///         match direction {
///             Direction::Members => self.members(entry),
///             Direction::MemberOf => self.groups(entry),
///         }
///     }
/// }
/// ```
pub trait Directory {
    /// Handle type returned for every entry
    type Entry: DirectoryEntry;

    /// Resolve an identity to exactly one entry
    ///
    /// Returns [`ProviderError::NotFound`] or [`ProviderError::Ambiguous`]
    /// when the identity matches zero or several entries.
    fn find(&self, identity: &str) -> Result<Self::Entry, ProviderError>;

    /// Enumerate the direct children of `entry` in the given direction
    ///
    /// Order does not matter, the traversal sorts siblings itself.
    fn children(
        &self,
        entry: &Self::Entry,
        direction: Direction,
    ) -> Result<Vec<Self::Entry>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Principal(&'static str, ObjectClass);

    impl DirectoryEntry for Principal {
        fn key(&self) -> &str {
            self.0
        }

        fn name(&self) -> &str {
            self.0
        }

        fn object_class(&self) -> ObjectClass {
            self.1
        }
    }

    #[test]
    fn test_default_kind() {
        assert_eq!(Principal("g", ObjectClass::Group).kind(), NodeKind::Expandable);
        assert_eq!(Principal("u", ObjectClass::User).kind(), NodeKind::Leaf);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::default(), Direction::Members);
        assert_eq!(Direction::Members.to_string(), "members");
        assert_eq!(Direction::MemberOf.to_string(), "member-of");
    }
}
