//! Staged accumulation of the traversal output

use crate::tree::render::convert_to_tree;
use crate::tree::{NodeArena, NodeId, TreeObject};

/// Collects finalized occurrences in output order
///
/// Leaf children found while expanding a node are staged and committed as a
/// block once the expansion is done, so they always sit right under their
/// parent instead of being interleaved with a sibling group's subtree.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    staged: Vec<NodeId>,
    output: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append directly to the output
    pub fn add(&mut self, id: NodeId) {
        self.output.push(id);
    }

    /// Defer an occurrence until the next [`commit_staged`](Self::commit_staged)
    pub fn stage(&mut self, id: NodeId) {
        self.staged.push(id);
    }

    /// Move every staged occurrence to the output, in order
    pub fn commit_staged(&mut self) {
        if !self.staged.is_empty() {
            self.output.append(&mut self.staged);
        }
    }

    pub fn output(&self) -> &[NodeId] {
        &self.output
    }

    pub fn staged(&self) -> &[NodeId] {
        &self.staged
    }

    pub fn clear(&mut self) {
        self.output.clear();
        self.staged.clear();
    }

    /// Snapshot the output as rendered records with tree connectors fixed up
    pub fn get_tree(&self, arena: &NodeArena) -> Vec<TreeObject> {
        let mut objects: Vec<TreeObject> =
            self.output.iter().map(|&id| arena.to_object(id)).collect();

        let mut lines: Vec<String> = objects
            .iter_mut()
            .map(|object| std::mem::take(&mut object.hierarchy))
            .collect();
        convert_to_tree(&mut lines);

        for (object, line) in objects.iter_mut().zip(lines) {
            object.hierarchy = line;
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{EntryInfo, ObjectClass};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    #[test]
    fn test_commit_staged_preserves_order() {
        let mut builder = TreeBuilder::new();
        builder.add(NodeId(0));
        builder.stage(NodeId(1));
        builder.stage(NodeId(2));
        assert_eq!(builder.output(), &[NodeId(0)]);

        builder.commit_staged();
        builder.add(NodeId(3));
        assert_eq!(builder.output(), &[NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        assert!(builder.staged().is_empty());
    }

    #[test]
    fn test_clear() {
        let mut builder = TreeBuilder::new();
        builder.add(NodeId(0));
        builder.stage(NodeId(1));
        builder.clear();
        assert!(builder.output().is_empty());
        assert!(builder.staged().is_empty());
    }

    #[test]
    fn test_get_tree_renders_connectors() {
        let mut arena = NodeArena::new();
        let source: Rc<str> = Rc::from("CN=R");
        let info = |name: &str, class| Rc::new(EntryInfo::new(format!("CN={name}"), name, class));

        let root = arena.insert(info("R", ObjectClass::Group), Rc::clone(&source), None, 0);
        let l1 = arena.insert(info("L1", ObjectClass::User), Rc::clone(&source), Some(root), 1);
        let g1 = arena.insert(info("G1", ObjectClass::Group), Rc::clone(&source), Some(root), 1);
        let l2 = arena.insert(info("L2", ObjectClass::User), source, Some(g1), 2);

        let mut builder = TreeBuilder::new();
        builder.add(root);
        builder.stage(l1);
        builder.commit_staged();
        builder.add(g1);
        builder.stage(l2);
        builder.commit_staged();

        let lines: Vec<String> = builder
            .get_tree(&arena)
            .into_iter()
            .map(|object| object.hierarchy)
            .collect();
        assert_eq!(lines, vec!["R", "├── L1", "└── G1", "    └── L2"]);
    }
}
