//! Directory enumeration with depth bounds and attribute filters.
//!
//! [`Scanner`] is the one place that decides which entries need work.
//! Detection counts what it yields and application mutates what it
//! yields, so the two can never disagree about what a mismatch is.

use crate::types::{EntryType, Mode};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Attribute an entry must differ from in order to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// Permission bits not exactly equal to the mode
    Mode(Mode),
    /// Owning uid not equal to this one
    Owner(u32),
    /// Owning gid not equal to this one
    Group(u32),
}

impl Mismatch {
    fn matches(self, entry: &DirEntry) -> walkdir::Result<bool> {
        let meta = entry.metadata()?;
        Ok(match self {
            Self::Mode(mode) => !mode.matches(meta.mode()),
            Self::Owner(uid) => meta.uid() != uid,
            Self::Group(gid) => meta.gid() != gid,
        })
    }
}

/// Narrows a scan. The default filter selects every entry in range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Only entries of this type
    pub entry_type: Option<EntryType>,
    /// Only entries whose attribute differs
    pub mismatch: Option<Mismatch>,
}

impl ScanFilter {
    /// Select everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one entry type.
    pub fn of_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Restrict to entries with a mismatching attribute.
    pub fn mismatching(mut self, mismatch: Mismatch) -> Self {
        self.mismatch = Some(mismatch);
        self
    }

    fn matches(&self, entry: &DirEntry) -> walkdir::Result<bool> {
        if let Some(entry_type) = self.entry_type
            && !entry_type.matches(entry.file_type())
        {
            return Ok(false);
        }
        match self.mismatch {
            Some(mismatch) => mismatch.matches(entry),
            None => Ok(true),
        }
    }
}

/// Walks a tree between two depths. Root is depth 0.
///
/// Every call to [`Scanner::scan`] starts a fresh walk; nothing is cached
/// between calls. Symbolic links are reported but never followed, and
/// that includes a root which is itself a link: resolve it first, as
/// [`ChangeRequest::new`](crate::ChangeRequest::new) does.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    min_depth: usize,
    max_depth: Option<usize>,
}

impl Scanner {
    /// Scan everything under `root`, root included.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_depth: 0,
            max_depth: None,
        }
    }

    /// Skip entries shallower than `depth`.
    pub fn min_depth(mut self, depth: usize) -> Self {
        self.min_depth = depth;
        self
    }

    /// Skip entries deeper than `depth`; `None` means unbounded.
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Root of the walk.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yield the paths in range that pass `filter`.
    ///
    /// Entries are yielded parent first, siblings sorted by file name. Any
    /// walk failure is yielded as an error; callers must not treat the
    /// paths seen before it as the complete set.
    pub fn scan(&self, filter: ScanFilter) -> impl Iterator<Item = walkdir::Result<PathBuf>> {
        let mut walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(self.min_depth);
        if let Some(max) = self.max_depth {
            walker = walker.max_depth(max);
        }

        walker.into_iter().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err)),
            };
            log::trace!("scan {} (depth {})", entry.path().display(), entry.depth());
            match filter.matches(&entry) {
                Ok(true) => Some(Ok(entry.into_path())),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        })
    }

    /// Number of entries passing `filter`.
    pub fn count(&self, filter: ScanFilter) -> walkdir::Result<usize> {
        self.scan(filter)
            .try_fold(0usize, |count, path| path.map(|_| count + 1))
    }
}

impl std::fmt::Display for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.root.display(), f)
    }
}
