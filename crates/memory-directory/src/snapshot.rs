use anyhow::{Context, Result};
use membership_tree::tree::ObjectClass;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One object of a directory snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    /// Unique key of the object
    pub distinguished_name: String,
    /// Short name used for display and lookups
    pub sam_account_name: String,
    /// Structural class (`group`, `user`, `computer`, ...)
    pub object_class: ObjectClass,
    /// Distinguished names of direct members
    #[serde(default)]
    pub members: Vec<String>,
    /// Enumerating this object fails, as with missing read permissions
    #[serde(default)]
    pub unreadable: bool,
}

impl DirectoryObject {
    pub fn new(
        distinguished_name: impl Into<String>,
        sam_account_name: impl Into<String>,
        object_class: ObjectClass,
    ) -> Self {
        Self {
            distinguished_name: distinguished_name.into(),
            sam_account_name: sam_account_name.into(),
            object_class,
            members: Vec::new(),
            unreadable: false,
        }
    }
}

/// Serialized form of a whole directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub objects: Vec<DirectoryObject>,
}

impl DirectorySnapshot {
    /// Read a snapshot from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory snapshot {}", path.display()))?;

        Self::from_json_str(&content)
            .with_context(|| format!("Invalid directory snapshot {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(content).context("Failed to parse directory snapshot")?;
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize directory snapshot")
    }
}
