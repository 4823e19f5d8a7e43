//! Error types for permission and ownership enforcement.
//!
//! Errors fall into two kinds. Validation errors are raised while a
//! [`ChangeRequest`](crate::ChangeRequest) is built, before the tree is
//! touched. Execution errors come from the walk or from the chmod/chown
//! primitives and carry the operation and path that failed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable; fix the input and try again.
    Validation,
    /// The filesystem refused a scan or an attribute change.
    Execution,
}

impl ErrorKind {
    /// Heading for reports of this kind of error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid request",
            Self::Execution => "Execution failed",
        }
    }
}

/// Which identity database a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// The user (passwd) database
    User,
    /// The group database
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// Errors that can occur while validating or executing a change request.
#[derive(Debug, Error)]
pub enum Error {
    /// Root path is missing or not a directory
    #[error("Path '{}' does not exist or is not a directory.", .0.display())]
    NotADirectory(PathBuf),

    /// Neither owner, group nor mode was requested
    #[error("Please specify at least one of owner, group and/or mode.")]
    NothingRequested,

    /// Mode is not an octal value in 0..=7777
    #[error("Mode must be octal.")]
    InvalidMode(String),

    /// Mask is not an octal value in 0..=7777
    #[error("Mask must be octal.")]
    InvalidMask(String),

    /// Minimum depth lies beyond the maximum depth
    #[error("Minimum depth {min} exceeds maximum depth {max}.")]
    DepthRange {
        /// Requested minimum depth
        min: usize,
        /// Requested maximum depth
        max: usize,
    },

    /// Owner or group was given as an empty string
    #[error("The {0} name cannot be empty.")]
    EmptyIdentity(IdentityKind),

    /// No such user
    #[error("User '{0}' does not exist.")]
    UnknownUser(String),

    /// No such group
    #[error("Group '{0}' does not exist.")]
    UnknownGroup(String),

    /// The user or group database could not be read
    #[error("failed to look up {kind} '{name}': {source}")]
    Lookup {
        /// Database consulted
        kind: IdentityKind,
        /// Name being resolved
        name: String,
        /// Underlying OS error
        #[source]
        source: nix::Error,
    },

    /// Walking the tree failed (unreadable directory, entry vanished, ...)
    #[error("{operation}: scan failed: {source}")]
    Scan {
        /// Operation that issued the scan
        operation: String,
        /// Walk error, including the offending path when known
        #[source]
        source: walkdir::Error,
    },

    /// chmod or chown on a single entry failed
    #[error("{operation}: failed to update {}: {source}", .path.display())]
    Apply {
        /// Operation being applied
        operation: String,
        /// Entry that could not be changed
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotADirectory(_)
            | Self::NothingRequested
            | Self::InvalidMode(_)
            | Self::InvalidMask(_)
            | Self::DepthRange { .. }
            | Self::EmptyIdentity(_)
            | Self::UnknownUser(_)
            | Self::UnknownGroup(_)
            | Self::Lookup { .. } => ErrorKind::Validation,
            Self::Scan { .. } | Self::Apply { .. } => ErrorKind::Execution,
        }
    }

    /// Whether the request was rejected before touching the filesystem.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type for rightskit operations.
pub type Result<T> = std::result::Result<T, Error>;
