//! Bounded, cycle-safe traversal of membership graphs
//!
//! This module turns a directory of groups and principals into an ordered,
//! indented tree. Groups are expanded at most once per run and repeated
//! occurrences are replayed, flagged as cycles, or marked as processed.

mod builder;
mod cache;
mod cancel;
mod compare;
mod error;
mod node;
mod options;
pub mod render;
mod traits;
mod traversal;

pub use builder::TreeBuilder;
pub use cache::EntryCache;
pub use cancel::CancellationToken;
pub use compare::{compare_entries, sort_entries};
pub use error::{Diagnostic, ErrorCategory, ProviderError, Result, TreeError};
pub use node::{EntryInfo, NodeArena, NodeId, NodeKind, ObjectClass, TreeNode, TreeObject};
pub use options::{ExclusionFilter, TraversalOptions, DEFAULT_DEPTH};
pub use traits::{Direction, Directory, DirectoryEntry};
pub use traversal::{traverse, TreeOutput, TreeTraversal};

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        CancellationToken, Diagnostic, Direction, Directory, DirectoryEntry, ErrorCategory,
        NodeKind, ObjectClass, ProviderError, TraversalOptions, TreeError, TreeObject, TreeOutput,
        TreeTraversal,
    };
}
