//! Core node types for the membership tree

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::tree::render::{indent, CIRCULAR_MARKER, PROCESSED_MARKER};

/// Unique identifier for a node occurrence within one traversal
///
/// Internally represented as an index into an arena-based storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId from a usize
    pub const fn new(id: usize) -> Self {
        NodeId(id)
    }

    /// Get the inner usize value
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(id: usize) -> Self {
        NodeId(id)
    }
}

impl From<NodeId> for usize {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Whether a node can own children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A group-like node - can have children and be part of a cycle
    #[display(fmt = "Expandable")]
    Expandable,
    /// A terminal node - user, computer or any other principal
    #[display(fmt = "Leaf")]
    Leaf,
}

impl NodeKind {
    /// Returns true if this is an expandable node
    pub const fn is_expandable(self) -> bool {
        matches!(self, NodeKind::Expandable)
    }

    /// Returns true if this is a leaf node
    pub const fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Leaf)
    }
}

/// Structural object class of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    #[display(fmt = "group")]
    Group,
    #[display(fmt = "user")]
    User,
    #[display(fmt = "computer")]
    Computer,
    /// Any other principal (contacts, foreign security principals, ...)
    #[display(fmt = "other")]
    #[serde(other)]
    Other,
}

impl ObjectClass {
    /// Only groups are expanded, everything else is a leaf
    pub const fn node_kind(self) -> NodeKind {
        match self {
            ObjectClass::Group => NodeKind::Expandable,
            _ => NodeKind::Leaf,
        }
    }
}

/// Immutable attributes shared by every occurrence of the same entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Stable identifier (distinguished name)
    pub key: String,
    /// Display name (account name)
    pub name: String,
    /// Object class of the entry
    pub class: ObjectClass,
}

impl EntryInfo {
    pub fn new(key: impl Into<String>, name: impl Into<String>, class: ObjectClass) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            class,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.class.node_kind()
    }
}

/// Index of a children list shared between clones of the same group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MembersId(usize);

/// A single occurrence of an entry in the traversal
#[derive(Debug, Clone)]
pub struct TreeNode {
    info: Rc<EntryInfo>,
    source: Rc<str>,
    parent: Option<NodeId>,
    depth: usize,
    hierarchy: String,
    members: Option<MembersId>,
    is_circular: bool,
    is_processed: bool,
}

impl TreeNode {
    pub fn key(&self) -> &str {
        &self.info.key
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn class(&self) -> ObjectClass {
        self.info.class
    }

    pub fn kind(&self) -> NodeKind {
        self.info.kind()
    }

    pub fn info(&self) -> &Rc<EntryInfo> {
        &self.info
    }

    /// Key of the traversal root this occurrence belongs to
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Display line, including any circular or processed annotation
    pub fn hierarchy(&self) -> &str {
        &self.hierarchy
    }

    pub fn is_circular(&self) -> bool {
        self.is_circular
    }

    pub fn is_processed(&self) -> bool {
        self.is_processed
    }
}

/// Arena holding every node occurrence and every children list of one traversal
///
/// Clones of the same group point at the same children list, so children
/// discovered on the first expansion are visible to every later occurrence.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<TreeNode>,
    members: Vec<Vec<NodeId>>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.members.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.get())
    }

    pub(crate) fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.get()]
    }

    /// Create a fresh occurrence. Expandable entries get their own empty children list.
    pub fn insert(
        &mut self,
        info: Rc<EntryInfo>,
        source: Rc<str>,
        parent: Option<NodeId>,
        depth: usize,
    ) -> NodeId {
        let members = info.kind().is_expandable().then(|| self.new_members());
        let hierarchy = indent(&info.name, depth);
        self.push(TreeNode {
            info,
            source,
            parent,
            depth,
            hierarchy,
            members,
            is_circular: false,
            is_processed: false,
        })
    }

    /// Copy an occurrence to a new position in the tree.
    ///
    /// The clone shares the children list of the original and starts with
    /// clean circular/processed flags.
    pub fn clone_at(&mut self, id: NodeId, parent: NodeId, depth: usize) -> NodeId {
        let original = self.node(id);
        let node = TreeNode {
            info: Rc::clone(&original.info),
            source: Rc::clone(&original.source),
            parent: Some(parent),
            depth,
            hierarchy: indent(&original.info.name, depth),
            members: original.members,
            is_circular: false,
            is_processed: false,
        };
        self.push(node)
    }

    /// Append a child to the children list of an expandable node
    pub fn add_member(&mut self, parent: NodeId, child: NodeId) {
        if let Some(members) = self.node(parent).members {
            self.members[members.0].push(child);
        }
    }

    /// Children recorded for this node (empty for leaves)
    pub fn members(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).members {
            Some(members) => &self.members[members.0],
            None => &[],
        }
    }

    /// Point `id` at the children list of the canonical occurrence `canonical`
    pub fn link_members(&mut self, id: NodeId, canonical: NodeId) {
        let source = self.node(canonical);
        let members = source.members;
        let circular = source.is_circular;
        if members.is_some() {
            self.nodes[id.get()].members = members;
        }
        if circular {
            self.set_circular(id);
        }
    }

    /// Walk the parent chain looking for an ancestor with the same key
    pub fn is_circular_nested(&self, id: NodeId) -> bool {
        let node = self.node(id);
        if !node.kind().is_expandable() {
            return false;
        }

        let mut current = node.parent;
        while let Some(parent_id) = current {
            let parent = self.node(parent_id);
            if parent.key() == node.key() {
                return true;
            }
            current = parent.parent;
        }
        false
    }

    pub fn set_circular(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.get()];
        if !node.is_circular {
            node.is_circular = true;
            node.hierarchy.push_str(CIRCULAR_MARKER);
        }
    }

    pub fn set_processed(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.get()];
        if !node.is_processed {
            node.is_processed = true;
            node.hierarchy.push_str(PROCESSED_MARKER);
        }
    }

    fn new_members(&mut self) -> MembersId {
        self.members.push(Vec::new());
        MembersId(self.members.len() - 1)
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Snapshot an occurrence as a rendered record
    pub fn to_object(&self, id: NodeId) -> TreeObject {
        let node = self.node(id);
        TreeObject {
            source: node.source.to_string(),
            key: node.info.key.clone(),
            name: node.info.name.clone(),
            class: node.info.class,
            kind: node.kind(),
            depth: node.depth,
            parent: node.parent.map(|parent| self.node(parent).key().to_string()),
            hierarchy: node.hierarchy.clone(),
            is_circular: node.is_circular,
            is_processed: node.is_processed,
        }
    }
}

/// A finalized node, as handed back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeObject {
    /// Key of the traversal root
    pub source: String,
    pub key: String,
    pub name: String,
    pub class: ObjectClass,
    pub kind: NodeKind,
    pub depth: usize,
    /// Key of the node this occurrence was reached from
    pub parent: Option<String>,
    /// Tree-drawing line ready for display
    pub hierarchy: String,
    pub is_circular: bool,
    pub is_processed: bool,
}

impl fmt::Display for TreeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str) -> Rc<EntryInfo> {
        Rc::new(EntryInfo::new(
            format!("CN={name},DC=test"),
            name,
            ObjectClass::Group,
        ))
    }

    fn user(name: &str) -> Rc<EntryInfo> {
        Rc::new(EntryInfo::new(
            format!("CN={name},DC=test"),
            name,
            ObjectClass::User,
        ))
    }

    #[test]
    fn test_node_id() {
        assert_eq!(NodeId::new(5).get(), 5);
        assert_eq!(NodeId::from(10), NodeId(10));
        assert_eq!(usize::from(NodeId(7)), 7);
    }

    #[test]
    fn test_node_kind() {
        assert!(NodeKind::Expandable.is_expandable());
        assert!(!NodeKind::Expandable.is_leaf());
        assert!(NodeKind::Leaf.is_leaf());
        assert!(!NodeKind::Leaf.is_expandable());
        assert_eq!(ObjectClass::Group.node_kind(), NodeKind::Expandable);
        assert_eq!(ObjectClass::Computer.node_kind(), NodeKind::Leaf);
        assert_eq!(ObjectClass::Other.to_string(), "other");
    }

    #[test]
    fn test_clone_shares_members() {
        let mut arena = NodeArena::new();
        let source: Rc<str> = Rc::from("CN=root,DC=test");
        let root = arena.insert(group("root"), Rc::clone(&source), None, 0);
        let child = arena.insert(group("child"), Rc::clone(&source), Some(root), 1);
        let leaf = arena.insert(user("alice"), Rc::clone(&source), Some(child), 2);
        arena.add_member(root, child);
        arena.add_member(child, leaf);

        let clone = arena.clone_at(child, root, 3);
        assert_eq!(arena.members(clone), &[leaf]);
        assert_eq!(arena.node(clone).depth(), 3);
        assert_eq!(arena.node(clone).parent(), Some(root));

        // late additions are visible through every clone
        let late = arena.insert(user("bob"), source, Some(child), 2);
        arena.add_member(child, late);
        assert_eq!(arena.members(clone), &[leaf, late]);
    }

    #[test]
    fn test_leaf_has_no_members() {
        let mut arena = NodeArena::new();
        let leaf = arena.insert(user("alice"), Rc::from("x"), None, 0);
        let other = arena.insert(user("bob"), Rc::from("x"), None, 0);
        arena.add_member(leaf, other);
        assert!(arena.members(leaf).is_empty());
    }

    #[test]
    fn test_circular_nested() {
        let mut arena = NodeArena::new();
        let source: Rc<str> = Rc::from("a");
        let a = arena.insert(group("a"), Rc::clone(&source), None, 0);
        let b = arena.insert(group("b"), Rc::clone(&source), Some(a), 1);
        let again = arena.clone_at(a, b, 2);
        assert!(!arena.is_circular_nested(a));
        assert!(!arena.is_circular_nested(b));
        assert!(arena.is_circular_nested(again));

        arena.set_circular(again);
        arena.set_circular(again);
        assert!(arena.node(again).is_circular());
        assert_eq!(
            arena.node(again).hierarchy(),
            format!("    └── a{}", CIRCULAR_MARKER)
        );
    }

    #[test]
    fn test_link_members() {
        let mut arena = NodeArena::new();
        let source: Rc<str> = Rc::from("r");
        let canonical = arena.insert(group("g"), Rc::clone(&source), None, 0);
        let leaf = arena.insert(user("u"), Rc::clone(&source), Some(canonical), 1);
        arena.add_member(canonical, leaf);

        let other = arena.insert(group("g"), source, None, 2);
        assert!(arena.members(other).is_empty());
        arena.link_members(other, canonical);
        assert_eq!(arena.members(other), &[leaf]);
    }

    #[test]
    fn test_to_object() {
        let mut arena = NodeArena::new();
        let source: Rc<str> = Rc::from("CN=root,DC=test");
        let root = arena.insert(group("root"), Rc::clone(&source), None, 0);
        let leaf = arena.insert(user("alice"), source, Some(root), 1);
        arena.set_processed(root);

        let object = arena.to_object(leaf);
        assert_eq!(object.parent.as_deref(), Some("CN=root,DC=test"));
        assert_eq!(object.hierarchy, "└── alice");
        assert_eq!(object.kind, NodeKind::Leaf);
        assert!(arena.to_object(root).is_processed);
        assert_eq!(arena.to_object(root).to_string(), format!("root{}", PROCESSED_MARKER));
    }
}
