//! Error types for membership traversal

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable category ids for errors and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The root identity matched nothing
    IdentityNotFound,
    /// The root identity matched several entries
    AmbiguousIdentity,
    /// Enumerating the children of one node failed
    EnumerationFailure,
    /// An exclusion pattern could not be compiled
    InvalidPattern,
    /// Any other failure while resolving the root
    Unspecified,
    /// The traversal was stopped from outside
    Cancelled,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::IdentityNotFound => "IdentityNotFound",
            ErrorCategory::AmbiguousIdentity => "AmbiguousIdentity",
            ErrorCategory::EnumerationFailure => "EnumerationFailure",
            ErrorCategory::InvalidPattern => "InvalidPattern",
            ErrorCategory::Unspecified => "Unspecified",
            ErrorCategory::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors reported by a [`Directory`](crate::tree::Directory) implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Cannot find an object with identity: '{0}'.")]
    NotFound(String),

    #[error("Multiple objects ({count}) match identity '{identity}'.")]
    Ambiguous { identity: String, count: usize },

    #[error("{0}")]
    Failed(String),

    /// Control-flow signal, never recovered from
    #[error("The operation was cancelled.")]
    Cancelled,
}

impl ProviderError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProviderError::Failed(message.into())
    }

    /// Signals that must unwind the traversal instead of being recorded
    pub fn is_control_flow(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

/// Errors that stop a root operation
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Cannot find an object with identity: '{0}'.")]
    IdentityNotFound(String),

    #[error("Multiple objects ({count}) match identity '{identity}'.")]
    AmbiguousIdentity { identity: String, count: usize },

    #[error("Failed to resolve identity '{identity}': {message}")]
    Unspecified { identity: String, message: String },

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("The traversal was cancelled.")]
    Cancelled,
}

impl TreeError {
    /// Map a failed root lookup for `identity` to a traversal error
    pub fn from_lookup(identity: &str, error: ProviderError) -> Self {
        match error {
            ProviderError::NotFound(_) => TreeError::IdentityNotFound(identity.to_string()),
            ProviderError::Ambiguous { count, .. } => TreeError::AmbiguousIdentity {
                identity: identity.to_string(),
                count,
            },
            ProviderError::Failed(message) => TreeError::Unspecified {
                identity: identity.to_string(),
                message,
            },
            ProviderError::Cancelled => TreeError::Cancelled,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TreeError::IdentityNotFound(_) => ErrorCategory::IdentityNotFound,
            TreeError::AmbiguousIdentity { .. } => ErrorCategory::AmbiguousIdentity,
            TreeError::Unspecified { .. } => ErrorCategory::Unspecified,
            TreeError::InvalidPattern { .. } => ErrorCategory::InvalidPattern,
            TreeError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TreeError::Cancelled)
    }
}

/// A recoverable problem attributed to one node of a finished traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    /// Key of the node the problem belongs to
    pub target: String,
    pub message: String,
}

impl Diagnostic {
    pub fn enumeration_failure(target: impl Into<String>, error: &ProviderError) -> Self {
        Self {
            category: ErrorCategory::EnumerationFailure,
            target: target.into(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.target, self.message)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TreeError>;
