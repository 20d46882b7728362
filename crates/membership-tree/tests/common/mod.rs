//! In-memory directory used by the integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use membership_tree::tree::{
    CancellationToken, Direction, Directory, DirectoryEntry, ObjectClass, ProviderError,
};

#[derive(Debug, Clone)]
struct Object {
    key: String,
    name: String,
    class: ObjectClass,
    members: Vec<String>,
}

/// A handle that counts itself as open until dropped
#[derive(Debug)]
pub struct MockEntry {
    key: String,
    name: String,
    class: ObjectClass,
    open: Rc<Cell<isize>>,
}

impl Drop for MockEntry {
    fn drop(&mut self) {
        self.open.set(self.open.get() - 1);
    }
}

impl DirectoryEntry for MockEntry {
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

/// Objects are addressed by name; keys are `CN=<name>,DC=test`
#[derive(Debug, Default)]
pub struct MockDirectory {
    objects: BTreeMap<String, Object>,
    failing: HashSet<String>,
    cancel_on: Option<(String, CancellationToken)>,
    abort_on: Option<String>,
    open: Rc<Cell<isize>>,
    queries: RefCell<HashMap<String, usize>>,
    lookups: Cell<usize>,
}

pub fn key(name: &str) -> String {
    format!("CN={name},DC=test")
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, name: &str, members: &[&str]) -> Self {
        self.insert(key(name), name, ObjectClass::Group, members);
        self
    }

    pub fn user(mut self, name: &str) -> Self {
        self.insert(key(name), name, ObjectClass::User, &[]);
        self
    }

    pub fn computer(mut self, name: &str) -> Self {
        self.insert(key(name), name, ObjectClass::Computer, &[]);
        self
    }

    /// A second object sharing `name` under another key
    pub fn duplicate(mut self, name: &str) -> Self {
        self.insert(format!("CN={name},OU=Other,DC=test"), name, ObjectClass::Group, &[]);
        self
    }

    /// Enumerating this group fails
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(key(name));
        self
    }

    /// Cancel `token` while enumerating this group
    pub fn cancel_on(mut self, name: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((key(name), token));
        self
    }

    /// Return a cancellation signal while enumerating this group
    pub fn abort_on(mut self, name: &str) -> Self {
        self.abort_on = Some(key(name));
        self
    }

    fn insert(&mut self, key: String, name: &str, class: ObjectClass, members: &[&str]) {
        self.objects.insert(
            key.clone(),
            Object {
                key,
                name: name.to_string(),
                class,
                members: members.iter().map(|member| member.to_string()).collect(),
            },
        );
    }

    /// Number of child enumerations performed for `name`
    pub fn queries(&self, name: &str) -> usize {
        self.queries.borrow().get(&key(name)).copied().unwrap_or(0)
    }

    pub fn total_queries(&self) -> usize {
        self.queries.borrow().values().sum()
    }

    /// Largest per-key enumeration count
    pub fn max_queries(&self) -> usize {
        self.queries.borrow().values().copied().max().unwrap_or(0)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }

    pub fn open_handles(&self) -> isize {
        self.open.get()
    }

    pub fn reset_counters(&self) {
        self.queries.borrow_mut().clear();
        self.lookups.set(0);
    }

    fn handle(&self, object: &Object) -> MockEntry {
        self.open.set(self.open.get() + 1);
        MockEntry {
            key: object.key.clone(),
            name: object.name.clone(),
            class: object.class,
            open: Rc::clone(&self.open),
        }
    }

    fn by_name(&self, name: &str) -> Vec<&Object> {
        self.objects
            .values()
            .filter(|object| object.name.eq_ignore_ascii_case(name))
            .collect()
    }
}

impl Directory for MockDirectory {
    type Entry = MockEntry;

    fn find(&self, identity: &str) -> Result<MockEntry, ProviderError> {
        self.lookups.set(self.lookups.get() + 1);
        if let Some(object) = self.objects.get(identity) {
            return Ok(self.handle(object));
        }

        match self.by_name(identity).as_slice() {
            [] => Err(ProviderError::NotFound(identity.to_string())),
            [object] => Ok(self.handle(object)),
            matches => Err(ProviderError::Ambiguous {
                identity: identity.to_string(),
                count: matches.len(),
            }),
        }
    }

    fn children(
        &self,
        entry: &MockEntry,
        direction: Direction,
    ) -> Result<Vec<MockEntry>, ProviderError> {
        *self
            .queries
            .borrow_mut()
            .entry(entry.key.clone())
            .or_default() += 1;

        if let Some((key, token)) = &self.cancel_on {
            if *key == entry.key {
                token.cancel();
            }
        }
        if self.abort_on.as_deref() == Some(entry.key.as_str()) {
            return Err(ProviderError::Cancelled);
        }
        if self.failing.contains(&entry.key) {
            return Err(ProviderError::failed("Insufficient access rights"));
        }

        let children = match direction {
            Direction::Members => self
                .objects
                .get(&entry.key)
                .map(|object| {
                    object
                        .members
                        .iter()
                        .flat_map(|name| self.by_name(name))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            Direction::MemberOf => self
                .objects
                .values()
                .filter(|object| {
                    object
                        .members
                        .iter()
                        .any(|member| member.eq_ignore_ascii_case(&entry.name))
                })
                .collect(),
        };

        Ok(children.into_iter().map(|object| self.handle(object)).collect())
    }
}
