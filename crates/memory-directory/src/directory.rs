use anyhow::{bail, Result};
use log::debug;
use membership_tree::tree::{Direction, Directory, DirectoryEntry, ObjectClass, ProviderError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::snapshot::{DirectoryObject, DirectorySnapshot};

/// A handle to one object of a [`MemoryDirectory`]
///
/// The directory counts handles that are still alive, see
/// [`MemoryDirectory::open_handles`].
#[derive(Debug)]
pub struct ObjectHandle {
    index: usize,
    key: String,
    name: String,
    class: ObjectClass,
    open: Rc<Cell<usize>>,
}

impl ObjectHandle {
    /// The distinguished name of the object
    pub fn distinguished_name(&self) -> &str {
        &self.key
    }
}

impl DirectoryEntry for ObjectHandle {
    fn key(&self) -> &str {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn object_class(&self) -> ObjectClass {
        self.class
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        self.open.set(self.open.get().saturating_sub(1));
    }
}

/// A directory held entirely in memory
///
/// Member references are resolved once when the directory is built, and a
/// reverse index answers member-of queries.
pub struct MemoryDirectory {
    objects: Vec<DirectoryObject>,
    by_dn: HashMap<String, usize>,
    by_account: HashMap<String, Vec<usize>>,
    members: Vec<Vec<usize>>,
    member_of: Vec<Vec<usize>>,
    queries: RefCell<HashMap<String, usize>>,
    open: Rc<Cell<usize>>,
}

impl MemoryDirectory {
    /// Load a directory from a JSON snapshot file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_snapshot(DirectorySnapshot::load(path)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_snapshot(DirectorySnapshot::from_json_str(content)?)
    }

    pub fn builder() -> DirectoryBuilder {
        DirectoryBuilder::default()
    }

    /// Index a snapshot. Distinguished names must be unique.
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self> {
        let objects = snapshot.objects;

        let mut by_dn = HashMap::with_capacity(objects.len());
        let mut by_account: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, object) in objects.iter().enumerate() {
            let dn = object.distinguished_name.to_lowercase();
            if by_dn.insert(dn, index).is_some() {
                bail!(
                    "Duplicate distinguished name in directory snapshot: {}",
                    object.distinguished_name
                );
            }
            by_account
                .entry(object.sam_account_name.to_lowercase())
                .or_default()
                .push(index);
        }

        let mut members = vec![Vec::new(); objects.len()];
        let mut member_of = vec![Vec::new(); objects.len()];
        for (index, object) in objects.iter().enumerate() {
            for member in &object.members {
                match by_dn.get(&member.to_lowercase()) {
                    Some(&child) => {
                        members[index].push(child);
                        member_of[child].push(index);
                    }
                    None => debug!(
                        "Skipping unknown member {} of {}",
                        member, object.distinguished_name
                    ),
                }
            }
        }

        debug!("Loaded directory with {} objects", objects.len());
        Ok(Self {
            objects,
            by_dn,
            by_account,
            members,
            member_of,
            queries: RefCell::new(HashMap::new()),
            open: Rc::new(Cell::new(0)),
        })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects in snapshot order
    pub fn objects(&self) -> &[DirectoryObject] {
        &self.objects
    }

    /// Number of child enumerations run for `dn`
    pub fn queries(&self, dn: &str) -> usize {
        self.queries
            .borrow()
            .get(&dn.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Number of child enumerations run for any object
    pub fn total_queries(&self) -> usize {
        self.queries.borrow().values().sum()
    }

    pub fn reset_queries(&self) {
        self.queries.borrow_mut().clear();
    }

    /// Handles handed out and not yet dropped
    pub fn open_handles(&self) -> usize {
        self.open.get()
    }

    fn handle(&self, index: usize) -> ObjectHandle {
        let object = &self.objects[index];
        self.open.set(self.open.get() + 1);
        ObjectHandle {
            index,
            key: object.distinguished_name.clone(),
            name: object.sam_account_name.clone(),
            class: object.object_class,
            open: Rc::clone(&self.open),
        }
    }

    fn resolve(&self, identity: &str) -> Result<usize, ProviderError> {
        let lowered = identity.to_lowercase();
        if let Some(&index) = self.by_dn.get(&lowered) {
            return Ok(index);
        }

        match self.by_account.get(&lowered).map(Vec::as_slice) {
            None | Some([]) => Err(ProviderError::NotFound(identity.to_string())),
            Some([index]) => Ok(*index),
            Some(matches) => Err(ProviderError::Ambiguous {
                identity: identity.to_string(),
                count: matches.len(),
            }),
        }
    }
}

impl Directory for MemoryDirectory {
    type Entry = ObjectHandle;

    fn find(&self, identity: &str) -> Result<ObjectHandle, ProviderError> {
        let index = self.resolve(identity)?;
        Ok(self.handle(index))
    }

    fn children(
        &self,
        entry: &ObjectHandle,
        direction: Direction,
    ) -> Result<Vec<ObjectHandle>, ProviderError> {
        *self
            .queries
            .borrow_mut()
            .entry(entry.key.to_lowercase())
            .or_default() += 1;

        let object = &self.objects[entry.index];
        if object.unreadable {
            return Err(ProviderError::failed(format!(
                "Insufficient access rights to enumerate {}",
                object.distinguished_name
            )));
        }

        let related = match direction {
            Direction::Members => &self.members[entry.index],
            Direction::MemberOf => &self.member_of[entry.index],
        };
        Ok(related.iter().map(|&index| self.handle(index)).collect())
    }
}

/// Programmatic construction of a [`MemoryDirectory`]
///
/// Objects are named by account name and get a distinguished name of the
/// form `CN=<name>,<base>`.
///
/// # Example
///
/// ```
/// use memory_directory::MemoryDirectory;
///
/// let directory = MemoryDirectory::builder()
///     .group("Admins", &["alice", "Helpdesk"])
///     .group("Helpdesk", &["bob"])
///     .user("alice")
///     .user("bob")
///     .build()
///     .unwrap();
///
/// assert_eq!(directory.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryBuilder {
    base: String,
    objects: Vec<DirectoryObject>,
}

impl Default for DirectoryBuilder {
    fn default() -> Self {
        Self {
            base: "DC=example,DC=com".to_string(),
            objects: Vec::new(),
        }
    }
}

impl DirectoryBuilder {
    /// Use another naming context for generated distinguished names
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// The distinguished name generated for `name`
    pub fn dn(&self, name: &str) -> String {
        format!("CN={},{}", name, self.base)
    }

    pub fn group(self, name: &str, members: &[&str]) -> Self {
        let members = members.iter().map(|member| self.dn(member)).collect();
        self.add(name, ObjectClass::Group, members)
    }

    pub fn user(self, name: &str) -> Self {
        self.add(name, ObjectClass::User, Vec::new())
    }

    pub fn computer(self, name: &str) -> Self {
        self.add(name, ObjectClass::Computer, Vec::new())
    }

    /// Make enumeration of `name` fail
    pub fn unreadable(mut self, name: &str) -> Self {
        let dn = self.dn(name);
        for object in &mut self.objects {
            if object.distinguished_name == dn {
                object.unreadable = true;
            }
        }
        self
    }

    /// Add a fully specified object
    pub fn object(mut self, object: DirectoryObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            objects: self.objects.clone(),
        }
    }

    pub fn build(self) -> Result<MemoryDirectory> {
        MemoryDirectory::from_snapshot(DirectorySnapshot {
            objects: self.objects,
        })
    }

    fn add(mut self, name: &str, class: ObjectClass, members: Vec<String>) -> Self {
        let mut object = DirectoryObject::new(self.dn(name), name, class);
        object.members = members;
        self.objects.push(object);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> MemoryDirectory {
        MemoryDirectory::builder()
            .group("Admins", &["alice", "Helpdesk", "ghost"])
            .group("Helpdesk", &["bob"])
            .user("alice")
            .user("bob")
            .computer("SRV01")
            .build()
            .unwrap()
    }

    fn names(handles: &[ObjectHandle]) -> Vec<&str> {
        handles.iter().map(|handle| handle.name()).collect()
    }

    #[test]
    fn test_find_by_dn_or_account_name() {
        let directory = sample();

        let by_name = directory.find("ADMINS").unwrap();
        assert_eq!(by_name.key(), "CN=Admins,DC=example,DC=com");
        assert_eq!(by_name.object_class(), ObjectClass::Group);

        let by_dn = directory.find("cn=bob,dc=example,dc=com").unwrap();
        assert_eq!(by_dn.name(), "bob");
    }

    #[test]
    fn test_find_errors() {
        let directory = MemoryDirectory::builder()
            .user("jdoe")
            .base("OU=Other,DC=example,DC=com")
            .user("jdoe")
            .build()
            .unwrap();

        assert_eq!(
            directory.find("nobody").unwrap_err(),
            ProviderError::NotFound("nobody".into())
        );
        assert_eq!(
            directory.find("jdoe").unwrap_err(),
            ProviderError::Ambiguous {
                identity: "jdoe".into(),
                count: 2
            }
        );
        assert!(directory.find("CN=jdoe,OU=Other,DC=example,DC=com").is_ok());
    }

    #[test]
    fn test_children_skip_dangling_members() {
        let directory = sample();
        let admins = directory.find("Admins").unwrap();

        let members = directory.children(&admins, Direction::Members).unwrap();
        assert_eq!(names(&members), vec!["alice", "Helpdesk"]);
        assert_eq!(directory.queries("CN=Admins,DC=example,DC=com"), 1);
    }

    #[test]
    fn test_member_of_uses_reverse_index() {
        let directory = sample();
        let bob = directory.find("bob").unwrap();
        let helpdesk = directory.find("Helpdesk").unwrap();

        let groups = directory.children(&bob, Direction::MemberOf).unwrap();
        assert_eq!(names(&groups), vec!["Helpdesk"]);

        let groups = directory.children(&helpdesk, Direction::MemberOf).unwrap();
        assert_eq!(names(&groups), vec!["Admins"]);
        assert_eq!(directory.total_queries(), 2);
    }

    #[test]
    fn test_unreadable() {
        let directory = MemoryDirectory::builder()
            .group("Secret", &["alice"])
            .user("alice")
            .unreadable("Secret")
            .build()
            .unwrap();
        let secret = directory.find("Secret").unwrap();

        let err = directory.children(&secret, Direction::Members).unwrap_err();
        assert!(err.to_string().contains("Insufficient access rights"));
        assert!(!err.is_control_flow());
    }

    #[test]
    fn test_open_handles() {
        let directory = sample();
        assert_eq!(directory.open_handles(), 0);

        let admins = directory.find("Admins").unwrap();
        let members = directory.children(&admins, Direction::Members).unwrap();
        assert_eq!(directory.open_handles(), 3);

        drop(members);
        assert_eq!(directory.open_handles(), 1);
        drop(admins);
        assert_eq!(directory.open_handles(), 0);
    }

    #[test]
    fn test_duplicate_dn() {
        let err = MemoryDirectory::builder()
            .user("alice")
            .user("ALICE")
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("Duplicate distinguished name"));
    }
}
