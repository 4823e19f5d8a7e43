//! # rightskit
//!
//! Recursively enforce ownership and permission bits on a directory tree,
//! or report what would change without touching anything.
//!
//! ## Core Concepts
//!
//! - **ChangeRequest**: validated input (root, owner, group, mode, mask,
//!   depth range, dry-run flag)
//! - **Scanner**: walks the tree between two depths and filters entries by
//!   type and by attribute mismatch
//! - **Operation**: one attribute change (directory mode, file mode, owner
//!   or group) that can be detected or applied on its own
//! - **Executor**: derives the operations of a request and runs them in
//!   detect (dry run) or apply (live run) mode
//!
//! ## Example
//!
//! ```no_run
//! use rightskit::{ChangeOptions, ChangeRequest, execute};
//!
//! let request = ChangeRequest::new(
//!     "/srv/share",
//!     ChangeOptions {
//!         mode: Some("2775".into()),
//!         mask: Some("0664".into()),
//!         group: Some("staff".into()),
//!         dry_run: true,
//!         ..Default::default()
//!     },
//! )?;
//!
//! let result = execute(&request)?;
//! for message in &result.messages {
//!     println!("{message}");
//! }
//! println!("exit code {}", result.exit_code);
//! # Ok::<(), rightskit::Error>(())
//! ```
//!
//! Directories get `mode`; regular files get `mode & mask`. Every detect or
//! apply call walks the tree again, so results always reflect the tree as
//! it is now.

#![warn(missing_docs)]

pub mod error;
pub mod executor;
pub mod operation;
pub mod planner;
pub mod scan;
pub mod types;

pub use error::{Error, ErrorKind, IdentityKind, Result};
pub use executor::{apply, detect, execute, execute_all};
pub use operation::{Detection, Operation};
pub use planner::plan;
pub use scan::{Mismatch, ScanFilter, Scanner};
pub use types::{
    ChangeOptions, ChangeRequest, EXIT_FAILURE, EXIT_NOTHING_TO_DO, EXIT_SUCCESS, EXIT_USAGE,
    EntryType, ExecutionResult, Mode, Principal,
};
