// In-memory directory provider for membership trees
// This crate loads a JSON snapshot of groups and principals and serves it
// through the membership-tree `Directory` trait

mod directory;
mod snapshot;

pub use directory::{DirectoryBuilder, MemoryDirectory, ObjectHandle};
pub use snapshot::{DirectoryObject, DirectorySnapshot};
