//! Attribute operations: one discrete, independently checkable change.

use crate::error::{Error, Result};
use crate::scan::{Mismatch, ScanFilter, Scanner};
use crate::types::{EntryType, Mode, Principal};
use std::fmt;
use std::fs;
use std::os::unix::fs::{PermissionsExt, lchown};
use std::path::PathBuf;

/// What a dry run learned about one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Number of entries that would change
    pub count: usize,
    /// Report line, e.g. "/srv: 3 paths have wrong mode (files, expected 0644)."
    pub message: String,
}

impl Detection {
    /// Whether anything would change.
    pub fn has_work(&self) -> bool {
        self.count > 0
    }
}

/// A single attribute change applied across a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Replace the permission bits of every entry of one type
    Mode {
        /// Entries this operation touches
        entry_type: EntryType,
        /// Full permission field to set
        mode: Mode,
    },
    /// Set the owning user, leaving the group alone
    Owner(Principal),
    /// Set the owning group, leaving the user alone
    Group(Principal),
}

impl Operation {
    /// Filter selecting the entries this operation still has to fix.
    pub fn filter(&self) -> ScanFilter {
        match self {
            Self::Mode { entry_type, mode } => ScanFilter::all()
                .of_type(*entry_type)
                .mismatching(Mismatch::Mode(*mode)),
            Self::Owner(user) => ScanFilter::all().mismatching(Mismatch::Owner(user.id())),
            Self::Group(group) => ScanFilter::all().mismatching(Mismatch::Group(group.id())),
        }
    }

    /// Attribute name used in reports.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::Mode { .. } => "mode",
            Self::Owner(_) => "owner",
            Self::Group(_) => "group",
        }
    }

    /// Count mismatching entries without changing anything.
    pub fn detect(&self, scanner: &Scanner) -> Result<Detection> {
        let count = scanner.count(self.filter()).map_err(|source| Error::Scan {
            operation: self.to_string(),
            source,
        })?;
        log::debug!("{self}: {count} mismatching entries under {scanner}");

        let target = match self {
            Self::Mode { entry_type, mode } => format!("{entry_type}, expected {mode}"),
            Self::Owner(user) => format!("expected {user}"),
            Self::Group(group) => format!("expected {group}"),
        };
        Ok(Detection {
            count,
            message: format!(
                "{scanner}: {count} paths have wrong {} ({target}).",
                self.attribute()
            ),
        })
    }

    /// Fix every mismatching entry and return how many were changed.
    ///
    /// The tree is re-scanned here rather than trusting an earlier
    /// [`detect`](Self::detect). Matching paths are collected before the
    /// first change, so a scan failure leaves the tree untouched by this
    /// operation.
    pub fn apply(&self, scanner: &Scanner) -> Result<usize> {
        let targets: Vec<PathBuf> = scanner
            .scan(self.filter())
            .collect::<walkdir::Result<_>>()
            .map_err(|source| Error::Scan {
                operation: self.to_string(),
                source,
            })?;

        for path in &targets {
            log::debug!("{self} {}", path.display());
            self.apply_one(path).map_err(|source| Error::Apply {
                operation: self.to_string(),
                path: path.clone(),
                source,
            })?;
        }

        log::info!("{self}: updated {} paths under {scanner}", targets.len());
        Ok(targets.len())
    }

    fn apply_one(&self, path: &std::path::Path) -> std::io::Result<()> {
        match self {
            Self::Mode { mode, .. } => {
                fs::set_permissions(path, fs::Permissions::from_mode(mode.bits()))
            }
            Self::Owner(user) => lchown(path, Some(user.id()), None),
            Self::Group(group) => lchown(path, None, Some(group.id())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode { entry_type, mode } => write!(f, "chmod {mode} ({entry_type})"),
            Self::Owner(user) => write!(f, "chown {user}"),
            Self::Group(group) => write!(f, "chgrp {group}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn chmod(path: &Path, mode: u32) {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    fn mode_of(path: &Path) -> u32 {
        fs::symlink_metadata(path).unwrap().mode() & 0o7777
    }

    fn mode_op(entry_type: EntryType, mode: &str) -> Operation {
        Operation::Mode {
            entry_type,
            mode: Mode::parse(mode).unwrap(),
        }
    }

    /// root/{one,two}/ and three files, everything 0755.
    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("one")).unwrap();
        fs::create_dir(root.join("two")).unwrap();
        for file in ["f1", "one/f2", "two/f3"] {
            fs::write(root.join(file), file).unwrap();
            chmod(&root.join(file), 0o755);
        }
        for dir in ["", "one", "two"] {
            chmod(&root.join(dir), 0o755);
        }
        tmp
    }

    #[test]
    fn test_detect_reports_count_and_kind() {
        let tmp = fixture();
        let scanner = Scanner::new(tmp.path());
        let op = mode_op(EntryType::File, "644");

        let detection = op.detect(&scanner).unwrap();
        assert!(detection.has_work());
        assert_eq!(detection.count, 3);
        assert_eq!(
            detection.message,
            format!(
                "{}: 3 paths have wrong mode (files, expected 0644).",
                tmp.path().display()
            )
        );
        // detection is side-effect free
        assert_eq!(mode_of(&tmp.path().join("f1")), 0o755);
    }

    #[test]
    fn test_detect_without_work() {
        let tmp = fixture();
        let scanner = Scanner::new(tmp.path());
        let detection = mode_op(EntryType::Dir, "755").detect(&scanner).unwrap();
        assert!(!detection.has_work());
        assert_eq!(detection.count, 0);
    }

    #[test]
    fn test_apply_mode_only_touches_its_entry_type() {
        let tmp = fixture();
        let scanner = Scanner::new(tmp.path());

        let changed = mode_op(EntryType::File, "640").apply(&scanner).unwrap();
        assert_eq!(changed, 3);
        assert_eq!(mode_of(&tmp.path().join("one/f2")), 0o640);
        assert_eq!(mode_of(&tmp.path().join("one")), 0o755);
        assert_eq!(mode_of(tmp.path()), 0o755);

        let changed = mode_op(EntryType::Dir, "750").apply(&scanner).unwrap();
        assert_eq!(changed, 3);
        assert_eq!(mode_of(&tmp.path().join("two")), 0o750);
        assert_eq!(mode_of(&tmp.path().join("two/f3")), 0o640);
    }

    #[test]
    fn test_apply_mode_replaces_special_bits() {
        let tmp = fixture();
        let dir = tmp.path().join("one");
        chmod(&dir, 0o2755);
        chmod(&tmp.path().join("f1"), 0o1755);

        let scanner = Scanner::new(tmp.path());
        mode_op(EntryType::Dir, "755").apply(&scanner).unwrap();
        mode_op(EntryType::File, "755").apply(&scanner).unwrap();
        assert_eq!(mode_of(&dir), 0o755);
        assert_eq!(mode_of(&tmp.path().join("f1")), 0o755);

        mode_op(EntryType::Dir, "2750").apply(&scanner).unwrap();
        assert_eq!(mode_of(&dir), 0o2750);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let tmp = fixture();
        let scanner = Scanner::new(tmp.path());
        let op = mode_op(EntryType::File, "600");
        assert_eq!(op.apply(&scanner).unwrap(), 3);
        assert_eq!(op.apply(&scanner).unwrap(), 0);
        assert!(!op.detect(&scanner).unwrap().has_work());
    }

    #[test]
    fn test_apply_respects_depth() {
        let tmp = fixture();
        let scanner = Scanner::new(tmp.path()).min_depth(1).max_depth(Some(1));
        mode_op(EntryType::File, "600").apply(&scanner).unwrap();
        mode_op(EntryType::Dir, "700").apply(&scanner).unwrap();
        assert_eq!(mode_of(&tmp.path().join("f1")), 0o600);
        assert_eq!(mode_of(&tmp.path().join("one/f2")), 0o755);
        assert_eq!(mode_of(&tmp.path().join("one")), 0o700);
        assert_eq!(mode_of(tmp.path()), 0o755);
    }

    #[test]
    fn test_ownership_to_self_is_a_no_op() {
        let tmp = fixture();
        let meta = fs::metadata(tmp.path()).unwrap();
        let scanner = Scanner::new(tmp.path());

        let owner = Operation::Owner(Principal::user(&meta.uid().to_string()).unwrap());
        let group = Operation::Group(Principal::group(&meta.gid().to_string()).unwrap());
        assert!(!owner.detect(&scanner).unwrap().has_work());
        assert!(!group.detect(&scanner).unwrap().has_work());
        assert_eq!(owner.apply(&scanner).unwrap(), 0);
        assert_eq!(group.apply(&scanner).unwrap(), 0);
        assert_eq!(fs::metadata(tmp.path().join("f1")).unwrap().uid(), meta.uid());
    }

    #[test]
    fn test_scan_failure_carries_operation() {
        let tmp = TempDir::new().unwrap();
        let scanner = Scanner::new(tmp.path().join("vanished"));
        let op = mode_op(EntryType::File, "644");

        let err = op.detect(&scanner).unwrap_err();
        assert!(matches!(err, Error::Scan { ref operation, .. } if operation == "chmod 0644 (files)"));
        assert!(!err.is_validation());

        let err = op.apply(&scanner).unwrap_err();
        assert!(matches!(err, Error::Scan { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(mode_op(EntryType::Dir, "750").to_string(), "chmod 0750 (directories)");
        let user = Principal::user("0").unwrap();
        assert_eq!(Operation::Owner(user.clone()).to_string(), "chown 0");
        assert_eq!(Operation::Group(user).to_string(), "chgrp 0");
    }
}
