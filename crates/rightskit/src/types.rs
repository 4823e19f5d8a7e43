//! Core types: octal modes, identities, change requests and results.

use crate::error::{Error, IdentityKind, Result};
use nix::unistd::{Group, User};
use std::fmt;
use std::fs::{self, FileType};
use std::ops::BitAnd;
use std::path::{Path, PathBuf};

/// Exit code of a live run that completed, or a dry run that found work.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a dry run that found nothing to change.
pub const EXIT_NOTHING_TO_DO: i32 = 1;
/// Exit code for validation and execution errors.
pub const EXIT_FAILURE: i32 = 2;
/// Exit code for command-line parsing errors.
pub const EXIT_USAGE: i32 = 3;

/// The full 12-bit permission field (setuid, setgid, sticky, rwx ×3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u32);

impl Mode {
    /// Highest representable mode.
    pub const MAX: u32 = 0o7777;

    /// Mask applied to the directory mode when none is given.
    pub const DEFAULT_MASK: Self = Self(0o666);

    /// Create a mode from raw bits, rejecting anything above `0o7777`.
    pub fn from_bits(bits: u32) -> Option<Self> {
        (bits <= Self::MAX).then_some(Self(bits))
    }

    /// Parse an octal string such as `755`, `0640` or `0o2775`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return None;
        }
        u32::from_str_radix(digits, 8).ok().and_then(Self::from_bits)
    }

    /// Raw permission bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether `raw` (an `st_mode`) carries exactly these permission bits.
    pub fn matches(self, raw: u32) -> bool {
        raw & Self::MAX == self.0
    }
}

impl BitAnd for Mode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

/// Kind of directory entry a mode operation is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// Regular files
    File,
    /// Directories
    Dir,
}

impl EntryType {
    /// Whether an (unfollowed) file type belongs to this kind.
    pub fn matches(self, file_type: FileType) -> bool {
        match self {
            Self::File => file_type.is_file(),
            Self::Dir => file_type.is_dir(),
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "files"),
            Self::Dir => write!(f, "directories"),
        }
    }
}

/// A user or group resolved to its numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: u32,
    name: String,
}

impl Principal {
    /// Resolve a user name or numeric uid.
    pub fn user(spec: &str) -> Result<Self> {
        Self::resolve(spec, IdentityKind::User)
    }

    /// Resolve a group name or numeric gid.
    pub fn group(spec: &str) -> Result<Self> {
        Self::resolve(spec, IdentityKind::Group)
    }

    fn resolve(spec: &str, kind: IdentityKind) -> Result<Self> {
        let name = spec.trim();
        if name.is_empty() {
            return Err(Error::EmptyIdentity(kind));
        }
        if let Ok(id) = name.parse::<u32>() {
            return Ok(Self {
                id,
                name: name.to_string(),
            });
        }

        let lookup_failed = |source: nix::Error| Error::Lookup {
            kind,
            name: name.to_string(),
            source,
        };
        let id = match kind {
            IdentityKind::User => User::from_name(name)
                .map_err(lookup_failed)?
                .ok_or_else(|| Error::UnknownUser(name.to_string()))?
                .uid
                .as_raw(),
            IdentityKind::Group => Group::from_name(name)
                .map_err(lookup_failed)?
                .ok_or_else(|| Error::UnknownGroup(name.to_string()))?
                .gid
                .as_raw(),
        };

        Ok(Self {
            id,
            name: name.to_string(),
        })
    }

    /// Numeric uid or gid.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Name as given by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Unvalidated input for a [`ChangeRequest`], as it arrives from a caller.
#[derive(Debug, Clone, Default)]
pub struct ChangeOptions {
    /// Target owner (name or uid)
    pub owner: Option<String>,
    /// Target group (name or gid)
    pub group: Option<String>,
    /// Target directory mode, octal
    pub mode: Option<String>,
    /// Mask ANDed with `mode` to get the file mode, octal (default 0666)
    pub mask: Option<String>,
    /// Minimum traversal depth (root is depth 0)
    pub min_depth: Option<usize>,
    /// Maximum traversal depth, unbounded when `None`
    pub max_depth: Option<usize>,
    /// Only report what would change
    pub dry_run: bool,
}

/// A validated, immutable request to enforce attributes on a tree.
#[derive(Debug, Clone)]
pub struct ChangeRequest {
    root: PathBuf,
    owner: Option<Principal>,
    group: Option<Principal>,
    mode: Option<Mode>,
    mask: Mode,
    min_depth: usize,
    max_depth: Option<usize>,
    dry_run: bool,
}

impl ChangeRequest {
    /// Validate `options` against `root`.
    ///
    /// Checks run in a fixed order and the first failure is returned: root
    /// directory, something requested, mode, mask, depth range, then the
    /// owner and group lookups. Nothing on disk is scanned or changed.
    ///
    /// A root that is itself a symlink is replaced by the directory it
    /// resolves to, so the walk starts at that directory.
    pub fn new(root: impl Into<PathBuf>, options: ChangeOptions) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotADirectory(root));
        }
        let root = if root.is_symlink() {
            fs::canonicalize(&root).map_err(|_| Error::NotADirectory(root.clone()))?
        } else {
            root
        };
        if options.owner.is_none() && options.group.is_none() && options.mode.is_none() {
            return Err(Error::NothingRequested);
        }

        let mode = options
            .mode
            .map(|m| Mode::parse(&m).ok_or(Error::InvalidMode(m)))
            .transpose()?;
        let mask = options
            .mask
            .map(|m| Mode::parse(&m).ok_or(Error::InvalidMask(m)))
            .transpose()?
            .unwrap_or(Mode::DEFAULT_MASK);

        let min_depth = options.min_depth.unwrap_or(0);
        if let Some(max) = options.max_depth
            && min_depth > max
        {
            return Err(Error::DepthRange {
                min: min_depth,
                max,
            });
        }

        let owner = options.owner.as_deref().map(Principal::user).transpose()?;
        let group = options.group.as_deref().map(Principal::group).transpose()?;

        Ok(Self {
            root,
            owner,
            group,
            mode,
            mask,
            min_depth,
            max_depth: options.max_depth,
            dry_run: options.dry_run,
        })
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Requested owner.
    pub fn owner(&self) -> Option<&Principal> {
        self.owner.as_ref()
    }

    /// Requested group.
    pub fn group(&self) -> Option<&Principal> {
        self.group.as_ref()
    }

    /// Requested directory mode.
    pub fn dir_mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Requested file mode: the directory mode ANDed with the mask.
    pub fn file_mode(&self) -> Option<Mode> {
        self.mode.map(|mode| mode & self.mask)
    }

    /// Mask used to derive the file mode.
    pub fn mask(&self) -> Mode {
        self.mask
    }

    /// Minimum traversal depth.
    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    /// Maximum traversal depth.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Whether this is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Same request, forced into dry-run mode.
    pub fn into_dry_run(self) -> Self {
        Self {
            dry_run: true,
            ..self
        }
    }
}

/// Exit code plus the messages produced by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Process exit code the caller should use
    pub exit_code: i32,
    /// Report lines, in operation order
    pub messages: Vec<String>,
}

impl ExecutionResult {
    /// A live run that completed.
    pub fn applied() -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            messages: Vec::new(),
        }
    }

    /// A dry run in which at least one operation reported work.
    pub fn work_found(messages: Vec<String>) -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            messages,
        }
    }

    /// A dry run in which no operation reported work.
    pub fn nothing_to_do() -> Self {
        Self {
            exit_code: EXIT_NOTHING_TO_DO,
            messages: vec!["Nothing to do.".to_string()],
        }
    }

    /// Whether a dry run found nothing to change.
    pub fn is_nothing_to_do(&self) -> bool {
        self.exit_code == EXIT_NOTHING_TO_DO
    }

    /// Combine the results of several runs of the same kind.
    ///
    /// "Nothing to do." entries are dropped unless every run reported
    /// nothing, in which case a single one remains.
    pub fn merge(results: impl IntoIterator<Item = Self>) -> Self {
        let mut any = false;
        let mut all_idle = true;
        let mut messages = Vec::new();
        for result in results {
            any = true;
            if result.is_nothing_to_do() {
                continue;
            }
            all_idle = false;
            messages.extend(result.messages);
        }

        if any && all_idle {
            Self::nothing_to_do()
        } else {
            Self {
                exit_code: EXIT_SUCCESS,
                messages,
            }
        }
    }
}
