//! Configuration options for a traversal.
//!
//! This module provides the `TraversalOptions` struct which controls the
//! direction of the walk, the depth bound, replay of repeated groups, and
//! which children are filtered out.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::tree::{Direction, TreeError};

/// Depth used when none is configured
pub const DEFAULT_DEPTH: usize = 3;

/// Configuration options for a membership traversal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalOptions {
    /// Which membership edge to follow.
    pub direction: Direction,

    /// Maximum depth displayed below the root.
    pub depth: usize,

    /// Ignore `depth` and walk the whole graph.
    pub recursive: bool,

    /// Replay every occurrence of a group instead of marking repeats as processed.
    pub show_all: bool,

    /// Only keep group children (members direction).
    pub groups_only: bool,

    /// Wildcard patterns matched case-insensitively against entry names.
    pub exclude: Vec<String>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Members,
            depth: DEFAULT_DEPTH,
            recursive: false,
            show_all: false,
            groups_only: false,
            exclude: Vec::new(),
        }
    }
}

impl TraversalOptions {
    /// Create new traversal options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the traversal direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the depth bound.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Enable or disable unbounded traversal.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Enable or disable replay of every occurrence.
    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }

    /// Enable or disable the groups-only filter.
    pub fn groups_only(mut self, groups_only: bool) -> Self {
        self.groups_only = groups_only;
        self
    }

    /// Add an exclusion pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Effective depth bound, unlimited when recursive.
    pub fn depth_bound(&self) -> usize {
        if self.recursive {
            usize::MAX
        } else {
            self.depth
        }
    }

    /// Compile the exclusion patterns.
    pub fn exclusion_filter(&self) -> Result<ExclusionFilter, TreeError> {
        ExclusionFilter::new(&self.exclude)
    }
}

/// Compiled wildcard exclusions
#[derive(Clone, Debug, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

impl ExclusionFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, TreeError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|source| TreeError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `name` matches any exclusion pattern
    pub fn is_excluded(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(name, MATCH_OPTIONS))
    }
}
