//! Membership Tree Library
//!
//! A library for rendering group membership graphs as bounded, cycle-safe
//! trees, in the style of the `tree` command:
//!
//! ```text
//! Domain Admins
//! ├── alice
//! ├── SRV01
//! ├── Helpdesk
//! │   ├── carol
//! │   └── Tier0 Admins
//! │       └── bob
//! └── Tier0 Admins ↔ Processed Group
//! ```
//!
//! # Core Concepts
//!
//! - **Directory**: Trait a data provider implements to resolve identities
//!   and enumerate one level of membership
//! - **TreeTraversal**: Depth-first engine that caches expanded groups,
//!   detects cycles and enforces the depth bound
//! - **TreeOutput**: Ordered nodes with their rendered display lines
//!
//! # Example
//!
//! ```ignore
//! use membership_tree::prelude::*;
//!
//! let options = TraversalOptions::new().depth(2).exclude("svc_*");
//! let mut traversal = TreeTraversal::new(&directory, options)?;
//!
//! let output = traversal.traverse("Domain Admins")?;
//! for line in output.lines() {
//!     println!("{line}");
//! }
//! if let Some(warning) = output.truncation_warning() {
//!     eprintln!("{warning}");
//! }
//! ```

pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::tree::prelude::*;
}
