//! Example that implements `Directory` for a hard-coded membership table
//!
//! Usage:
//!   cargo run --example static_directory [group] [depth]
//!
//! Defaults to "Domain Admins" with a depth of 3.

use std::env;

use membership_tree::tree::prelude::*;

/// (name, class, members)
const TABLE: &[(&str, ObjectClass, &[&str])] = &[
    ("Domain Admins", ObjectClass::Group, &["alice", "Tier0", "Helpdesk"]),
    ("Tier0", ObjectClass::Group, &["bob", "DC01$"]),
    ("Helpdesk", ObjectClass::Group, &["carol", "Tier0", "Helpdesk Leads"]),
    ("Helpdesk Leads", ObjectClass::Group, &["Helpdesk", "dave"]),
    ("alice", ObjectClass::User, &[]),
    ("bob", ObjectClass::User, &[]),
    ("carol", ObjectClass::User, &[]),
    ("dave", ObjectClass::User, &[]),
    ("DC01$", ObjectClass::Computer, &[]),
];

struct Row(usize);

impl DirectoryEntry for Row {
    fn key(&self) -> &str {
        TABLE[self.0].0
    }

    fn name(&self) -> &str {
        TABLE[self.0].0
    }

    fn object_class(&self) -> ObjectClass {
        TABLE[self.0].1
    }
}

struct StaticDirectory;

impl StaticDirectory {
    fn row(name: &str) -> Option<Row> {
        TABLE
            .iter()
            .position(|(row, _, _)| row.eq_ignore_ascii_case(name))
            .map(Row)
    }
}

impl Directory for StaticDirectory {
    type Entry = Row;

    fn find(&self, identity: &str) -> Result<Row, ProviderError> {
        Self::row(identity).ok_or_else(|| ProviderError::NotFound(identity.to_string()))
    }

    fn children(&self, entry: &Row, direction: Direction) -> Result<Vec<Row>, ProviderError> {
        let name = entry.name();
        let rows = match direction {
            Direction::Members => TABLE[entry.0]
                .2
                .iter()
                .filter_map(|member| Self::row(member))
                .collect(),
            Direction::MemberOf => (0..TABLE.len())
                .filter(|&i| TABLE[i].2.iter().any(|member| *member == name))
                .map(Row)
                .collect(),
        };
        Ok(rows)
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let root = args.get(1).map(String::as_str).unwrap_or("Domain Admins");
    let depth = match args.get(2).map(|depth| depth.parse::<usize>()) {
        None => 3,
        Some(Ok(depth)) => depth,
        Some(Err(e)) => {
            eprintln!("Invalid depth: {}", e);
            std::process::exit(1);
        }
    };

    let options = TraversalOptions::new().depth(depth);
    let mut traversal = match TreeTraversal::new(&StaticDirectory, options) {
        Ok(traversal) => traversal,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match traversal.traverse(root) {
        Ok(output) => {
            for line in output.lines() {
                println!("{}", line);
            }
            if let Some(warning) = output.truncation_warning() {
                eprintln!();
                eprintln!("WARNING: {}", warning);
            }
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}
