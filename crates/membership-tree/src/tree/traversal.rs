//! Stack-based traversal of a membership graph
//!
//! The walk is depth-first over an explicit LIFO stack of
//! `(handle, occurrence)` pairs. A handle is present when the occurrence was
//! discovered from the directory and absent when it was replayed from the
//! cache. Every expandable key is queried at most once per root operation;
//! later occurrences either replay the recorded children, close a cycle, or
//! are marked as already processed.

use log::{debug, info, trace, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::rc::Rc;

use crate::tree::compare::sort_entries;
use crate::tree::error::Result;
use crate::tree::{
    CancellationToken, Diagnostic, Direction, Directory, DirectoryEntry, EntryCache, EntryInfo,
    ExclusionFilter, NodeArena, NodeId, NodeKind, ProviderError, TraversalOptions, TreeBuilder,
    TreeError, TreeObject,
};

/// The rendered result of one root operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeOutput {
    /// Key of the traversal root
    pub source: String,
    /// Occurrences in display order
    pub nodes: Vec<TreeObject>,
    /// Some children were cut off by the depth bound
    pub truncated: bool,
    /// Effective depth bound of the run
    pub depth_bound: usize,
    /// Recoverable problems met along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl TreeOutput {
    /// The single aggregate notice for a truncated run
    pub fn truncation_warning(&self) -> Option<String> {
        self.truncated.then(|| {
            format!(
                "Result is truncated as enumeration has exceeded the set depth of {}.",
                self.depth_bound
            )
        })
    }

    /// Display lines in order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.hierarchy.as_str())
    }

    /// The whole tree as one newline-separated string
    pub fn render(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Traversal engine bound to one directory
///
/// The engine owns all per-run state (arena, cache, stack, output) and resets
/// it at the start of every root operation, so one engine can be reused for
/// many identities.
///
/// # Example
///
/// ```ignore
/// let mut traversal = TreeTraversal::new(&directory, TraversalOptions::new().depth(2))?;
/// let output = traversal.traverse("Domain Admins")?;
/// println!("{}", output.render());
/// ```
pub struct TreeTraversal<'d, D: Directory> {
    directory: &'d D,
    options: TraversalOptions,
    exclusions: ExclusionFilter,
    cancellation: CancellationToken,
    arena: NodeArena,
    cache: EntryCache,
    builder: TreeBuilder,
    stack: Vec<(Option<D::Entry>, NodeId)>,
    visited: HashSet<String>,
    truncated: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'d, D: Directory> TreeTraversal<'d, D> {
    /// Create an engine, compiling the exclusion patterns up front
    pub fn new(directory: &'d D, options: TraversalOptions) -> Result<Self> {
        let exclusions = options.exclusion_filter()?;
        Ok(Self {
            directory,
            options,
            exclusions,
            cancellation: CancellationToken::new(),
            arena: NodeArena::new(),
            cache: EntryCache::new(),
            builder: TreeBuilder::new(),
            stack: Vec::new(),
            visited: HashSet::new(),
            truncated: false,
            diagnostics: Vec::new(),
        })
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// A handle that stops the traversal when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn options(&self) -> &TraversalOptions {
        &self.options
    }

    /// Run one root operation
    ///
    /// Lookup failures of the root are returned as errors and nothing is
    /// traversed. Enumeration failures below the root are recorded in
    /// [`TreeOutput::diagnostics`]. Cancellation discards the partial output.
    pub fn traverse(&mut self, identity: &str) -> Result<TreeOutput> {
        self.reset();
        let result = self.run(identity);
        if result.is_err() {
            // releases the handles still on the stack
            self.stack.clear();
        }
        result
    }

    /// Run one root operation per identity, each with fresh state
    ///
    /// Stops after the first cancelled run.
    pub fn traverse_all<I, S>(&mut self, identities: I) -> Vec<Result<TreeOutput>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for identity in identities {
            let result = self.traverse(identity.as_ref());
            let cancelled = matches!(result, Err(TreeError::Cancelled));
            results.push(result);
            if cancelled {
                break;
            }
        }
        results
    }

    fn reset(&mut self) {
        self.arena.clear();
        self.cache.clear();
        self.builder.clear();
        self.stack.clear();
        self.visited.clear();
        self.truncated = false;
        self.diagnostics.clear();
    }

    fn run(&mut self, identity: &str) -> Result<TreeOutput> {
        if self.cancellation.is_cancelled() {
            return Err(TreeError::Cancelled);
        }

        let root = self
            .directory
            .find(identity)
            .map_err(|err| TreeError::from_lookup(identity, err))?;
        let source: Rc<str> = Rc::from(root.key());
        info!(
            "Traversing {} of '{}' ({})",
            self.options.direction,
            root.name(),
            source
        );

        match self.options.direction {
            Direction::Members => self.seed_members(identity, root, &source)?,
            Direction::MemberOf => self.seed_member_of(root, &source)?,
        }
        self.walk(&source)?;

        let nodes = self.builder.get_tree(&self.arena);
        let output = TreeOutput {
            source: source.to_string(),
            nodes,
            truncated: self.truncated,
            depth_bound: self.options.depth_bound(),
            diagnostics: std::mem::take(&mut self.diagnostics),
        };

        if let Some(warning) = output.truncation_warning() {
            warn!("{}", warning);
        }
        info!(
            "Finished {}: {} nodes, {} groups expanded, {} diagnostics",
            output.source,
            output.nodes.len(),
            self.cache.len(),
            output.diagnostics.len()
        );
        Ok(output)
    }

    /// Members direction: the root must be a group and goes through the stack
    fn seed_members(&mut self, identity: &str, root: D::Entry, source: &Rc<str>) -> Result<()> {
        if root.kind().is_leaf() {
            debug!("'{}' is a {}, not a group", identity, root.object_class());
            return Err(TreeError::IdentityNotFound(identity.to_string()));
        }

        if self.exclusions.is_excluded(root.name()) {
            debug!("Root '{}' is excluded", root.name());
            return Ok(());
        }

        let id = self
            .arena
            .insert(entry_info(&root), Rc::clone(source), None, 0);
        self.push(Some(root), id);
        Ok(())
    }

    /// Member-of direction: any principal can be the root; it is emitted and
    /// expanded right away, its groups start the stack at depth 1
    fn seed_member_of(&mut self, root: D::Entry, source: &Rc<str>) -> Result<()> {
        let info = entry_info(&root);
        let id = self
            .arena
            .insert(Rc::clone(&info), Rc::clone(source), None, 0);
        self.builder.add(id);
        if info.kind().is_expandable() {
            self.cache.try_add(&info.key, id);
        }

        self.expand(id, root, source, 1)?;
        self.visited.insert(info.key.clone());
        self.builder.commit_staged();
        Ok(())
    }

    fn walk(&mut self, source: &Rc<str>) -> Result<()> {
        loop {
            if self.cancellation.is_cancelled() {
                debug!("Cancelled with {} entries left on the stack", self.stack.len());
                return Err(TreeError::Cancelled);
            }

            let Some((handle, id)) = self.stack.pop() else {
                return Ok(());
            };

            let info = Rc::clone(self.arena.node(id).info());
            let depth = self.arena.node(id).depth() + 1;
            trace!("Popped {} at depth {}", info.key, depth - 1);
            self.builder.add(id);

            if !self.cache.try_add(&info.key, id) {
                drop(handle);
                self.replay(id, &info.key, depth);
                continue;
            }

            let entry = match handle {
                Some(entry) => entry,
                // replayed child that was never expanded before
                None => match self.directory.find(&info.key) {
                    Ok(entry) => entry,
                    Err(err) if err.is_control_flow() => return Err(TreeError::Cancelled),
                    Err(err) => {
                        self.record_failure(id, &err);
                        self.visited.insert(info.key.clone());
                        continue;
                    }
                },
            };

            self.expand(id, entry, source, depth)?;
            self.visited.insert(info.key.clone());
            self.builder.commit_staged();
        }
    }

    /// Handle an occurrence whose key is already cached
    fn replay(&mut self, id: NodeId, key: &str, depth: usize) {
        if let Some(canonical) = self.cache.try_get(key) {
            self.arena.link_members(id, canonical);
        }

        if self.arena.node(id).is_circular() || self.arena.is_circular_nested(id) {
            debug!("Circular reference to {}", key);
            self.arena.set_circular(id);
            return;
        }

        if self.options.show_all || self.visited.insert(key.to_string()) {
            self.build_from_cache(id, depth);
            return;
        }

        trace!("Already processed {}", key);
        self.arena.set_processed(id);
    }

    /// Rebuild the children of `id` from its shared children list
    fn build_from_cache(&mut self, id: NodeId, depth: usize) {
        let members = self.arena.members(id).to_vec();
        if members.is_empty() {
            return;
        }

        if depth > self.options.depth_bound() {
            self.truncated = true;
            return;
        }

        debug!(
            "Replaying {} children of {}",
            members.len(),
            self.arena.node(id).key()
        );
        for child in members {
            let clone = self.arena.clone_at(child, id, depth);
            match self.arena.node(child).kind() {
                NodeKind::Expandable => self.push(None, clone),
                NodeKind::Leaf => self.builder.add(clone),
            }
        }
    }

    /// Query the directory for the children of `id` and attach them
    ///
    /// `entry` is consumed and released once its children are processed.
    fn expand(&mut self, id: NodeId, entry: D::Entry, source: &Rc<str>, depth: usize) -> Result<()> {
        let Some(children) = self.enumerate(id, &entry)? else {
            return Ok(());
        };
        debug!("Expanding {} ({} children)", entry.key(), children.len());

        let bound = self.options.depth_bound();
        for child in children {
            if self.is_filtered(&child) {
                continue;
            }

            let child_id = match child.kind() {
                NodeKind::Leaf => {
                    let leaf =
                        self.arena
                            .insert(entry_info(&child), Rc::clone(source), Some(id), depth);
                    if depth <= bound {
                        self.builder.stage(leaf);
                    } else {
                        self.truncated = true;
                    }
                    leaf
                }
                NodeKind::Expandable => self.process_group(id, child, source, depth),
            };
            self.arena.add_member(id, child_id);
        }
        Ok(())
    }

    /// Push a group child and return the occurrence to record as the child
    ///
    /// A cached key is pushed as a clone but recorded as its canonical
    /// occurrence, so later replays see the authoritative children list.
    fn process_group(
        &mut self,
        parent: NodeId,
        entry: D::Entry,
        source: &Rc<str>,
        depth: usize,
    ) -> NodeId {
        if let Some(cached) = self.cache.try_get(entry.key()) {
            let clone = self.arena.clone_at(cached, parent, depth);
            self.push(Some(entry), clone);
            return cached;
        }

        let node = self
            .arena
            .insert(entry_info(&entry), Rc::clone(source), Some(parent), depth);
        self.push(Some(entry), node);
        node
    }

    fn push(&mut self, handle: Option<D::Entry>, id: NodeId) {
        let depth = self.arena.node(id).depth();
        if depth > self.options.depth_bound() {
            trace!("Not pushing {} at depth {}", self.arena.node(id).key(), depth);
            self.truncated = true;
            return;
        }

        self.stack.push((handle, id));
    }

    /// Sorted children of `entry`, or `None` after recording a failure
    fn enumerate(&mut self, id: NodeId, entry: &D::Entry) -> Result<Option<Vec<D::Entry>>> {
        match self.directory.children(entry, self.options.direction) {
            Ok(mut children) => {
                sort_entries(&mut children);
                Ok(Some(children))
            }
            Err(err) if err.is_control_flow() => Err(TreeError::Cancelled),
            Err(err) => {
                self.record_failure(id, &err);
                Ok(None)
            }
        }
    }

    fn record_failure(&mut self, id: NodeId, err: &ProviderError) {
        let key = self.arena.node(id).key();
        warn!("Failed to enumerate {}: {}", key, err);
        self.diagnostics.push(Diagnostic::enumeration_failure(key, err));
    }

    fn is_filtered(&self, child: &D::Entry) -> bool {
        if self.options.groups_only && child.kind().is_leaf() {
            return true;
        }

        if self.exclusions.is_excluded(child.name()) {
            trace!("Excluding {}", child.name());
            return true;
        }

        false
    }
}

fn entry_info<E: DirectoryEntry>(entry: &E) -> Rc<EntryInfo> {
    Rc::new(EntryInfo::new(entry.key(), entry.name(), entry.object_class()))
}

/// Convenience wrapper for a single root operation
pub fn traverse<D: Directory>(
    directory: &D,
    identity: &str,
    options: TraversalOptions,
) -> Result<TreeOutput> {
    TreeTraversal::new(directory, options)?.traverse(identity)
}
