//! Derive the operation list implied by a change request.

use crate::operation::Operation;
use crate::scan::Scanner;
use crate::types::{ChangeRequest, EntryType};

/// Operations a request implies, in reporting order.
///
/// Directory mode, then file mode (mode AND mask), then owner, then group.
/// The operations are independent; order only affects message order.
pub fn plan(request: &ChangeRequest) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(4);
    if let (Some(dir_mode), Some(file_mode)) = (request.dir_mode(), request.file_mode()) {
        operations.push(Operation::Mode {
            entry_type: EntryType::Dir,
            mode: dir_mode,
        });
        operations.push(Operation::Mode {
            entry_type: EntryType::File,
            mode: file_mode,
        });
    }
    if let Some(owner) = request.owner() {
        operations.push(Operation::Owner(owner.clone()));
    }
    if let Some(group) = request.group() {
        operations.push(Operation::Group(group.clone()));
    }
    operations
}

/// Scanner bounded to the request's root and depth range.
pub fn scanner(request: &ChangeRequest) -> Scanner {
    Scanner::new(request.root())
        .min_depth(request.min_depth())
        .max_depth(request.max_depth())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeOptions, Mode};
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    #[test]
    fn test_plan_order() {
        let tmp = TempDir::new().unwrap();
        let meta = std::fs::metadata(tmp.path()).unwrap();
        let request = ChangeRequest::new(
            tmp.path(),
            ChangeOptions {
                owner: Some(meta.uid().to_string()),
                group: Some(meta.gid().to_string()),
                mode: Some("0750".into()),
                mask: Some("0640".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let ops = plan(&request);
        assert_eq!(ops.len(), 4);
        assert_eq!(
            ops[0],
            Operation::Mode {
                entry_type: EntryType::Dir,
                mode: Mode::parse("750").unwrap()
            }
        );
        assert_eq!(
            ops[1],
            Operation::Mode {
                entry_type: EntryType::File,
                mode: Mode::parse("640").unwrap()
            }
        );
        assert!(matches!(ops[2], Operation::Owner(_)));
        assert!(matches!(ops[3], Operation::Group(_)));
    }

    #[test]
    fn test_plan_group_only() {
        let tmp = TempDir::new().unwrap();
        let request = ChangeRequest::new(
            tmp.path(),
            ChangeOptions {
                group: Some("0".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let ops = plan(&request);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].attribute(), "group");
    }
}
